//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::message::Speaker;
use crate::profile::ChatProfile;
use crate::session::{ChatSession, SessionError, SessionOptions};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new("test-session", true)
}

fn is_settling(effect: &Effect) -> bool {
    matches!(
        effect,
        Effect::FinalizeResponse { .. }
            | Effect::EndStream
            | Effect::AbortStream { .. }
            | Effect::RecordFailure { .. }
            | Effect::AbortRequest { .. }
    )
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_request_id() -> impl Strategy<Value = u64> {
    1u64..5
}

fn arb_busy_state() -> impl Strategy<Value = ChatState> {
    prop_oneof![
        arb_request_id().prop_map(|request_id| ChatState::AwaitingResponse { request_id }),
        arb_request_id().prop_map(|request_id| ChatState::Streaming { request_id }),
    ]
}

fn arb_state() -> impl Strategy<Value = ChatState> {
    prop_oneof![
        Just(ChatState::Idle),
        "[a-zA-Z ]{1,30}".prop_map(|message| ChatState::Error { message }),
        arb_busy_state(),
    ]
}

fn arb_transport_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (arb_request_id(), "[a-zA-Z{}\": ]{0,20}")
            .prop_map(|(request_id, text)| Event::ResponseComplete { request_id, text }),
        (arb_request_id(), "[a-zA-Z{}\": ]{1,20}")
            .prop_map(|(request_id, text)| Event::Fragment { request_id, text }),
        arb_request_id().prop_map(|request_id| Event::StreamEnded { request_id }),
        (arb_request_id(), "[a-z ]{1,20}")
            .prop_map(|(request_id, message)| Event::TransportFailed { request_id, message }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z ]{0,20}".prop_map(|text| Event::UserMessage { text }),
        Just(Event::UserCancel),
        arb_transport_event(),
    ]
}

/// Session-level input. Transport events name a request relative to the
/// most recent one so sequences hit both live and stale ids.
#[derive(Debug, Clone)]
enum Action {
    Send(String),
    Cancel,
    Complete { stale: bool, text: String },
    Fragment { stale: bool, text: String },
    End { stale: bool },
    Fail { stale: bool },
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        "[a-zA-Z ]{0,12}".prop_map(Action::Send),
        Just(Action::Cancel),
        (any::<bool>(), "[a-zA-Z{}\": ]{0,20}")
            .prop_map(|(stale, text)| Action::Complete { stale, text }),
        (any::<bool>(), "[a-zA-Z{}\": ]{1,12}")
            .prop_map(|(stale, text)| Action::Fragment { stale, text }),
        any::<bool>().prop_map(|stale| Action::End { stale }),
        any::<bool>().prop_map(|stale| Action::Fail { stale }),
    ]
}

fn to_event(action: Action, latest: u64) -> Event {
    let id = |stale: bool| if stale { latest.saturating_sub(1) } else { latest };
    match action {
        Action::Send(text) => Event::UserMessage { text },
        Action::Cancel => Event::UserCancel,
        Action::Complete { stale, text } => Event::ResponseComplete {
            request_id: id(stale),
            text,
        },
        Action::Fragment { stale, text } => Event::Fragment {
            request_id: id(stale),
            text,
        },
        Action::End { stale } => Event::StreamEnded {
            request_id: id(stale),
        },
        Action::Fail { stale } => Event::TransportFailed {
            request_id: id(stale),
            message: "connection reset".to_string(),
        },
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // A pending request blocks new sends
    #[test]
    fn prop_busy_rejects_messages(state in arb_busy_state(), text in "[a-zA-Z ]{1,30}") {
        let result = transition(&state, &test_context(), Event::UserMessage { text });
        prop_assert_eq!(result.unwrap_err(), TransitionError::Busy);
    }

    // Idle and Error accept any non-blank message and issue the next request id
    #[test]
    fn prop_idle_accepts_messages(
        text in "[a-zA-Z][a-zA-Z ]{0,30}",
        error in proptest::option::of("[a-z ]{1,20}"),
        next in 1u64..1000,
    ) {
        let state = match error {
            Some(message) => ChatState::Error { message },
            None => ChatState::Idle,
        };
        let mut ctx = test_context();
        ctx.next_request_id = next;

        let result = transition(&state, &ctx, Event::UserMessage { text: text.clone() }).unwrap();
        prop_assert_eq!(result.new_state, ChatState::AwaitingResponse { request_id: next });
        prop_assert_eq!(&result.effects[0], &Effect::RecordUserMessage { text });
    }

    // Events for a request that is not in flight change nothing
    #[test]
    fn prop_mismatched_request_ignored(state in arb_state(), event in arb_transport_event()) {
        prop_assume!(event.request_id() != state.request_id());

        let result = transition(&state, &test_context(), event).unwrap();
        prop_assert_eq!(result.new_state, state);
        prop_assert!(result.effects.is_empty());
    }

    // Leaving a busy state always settles or aborts the request
    #[test]
    fn prop_leaving_busy_settles(state in arb_busy_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_context(), event) {
            if !result.new_state.is_busy() {
                prop_assert!(
                    result.effects.iter().any(is_settling),
                    "Left {:?} without settling: {:?}",
                    state,
                    result.effects
                );
            }
        }
    }

    // Only a streaming state has an open assistant message
    #[test]
    fn prop_streaming_state_matches_transcript(
        actions in proptest::collection::vec(arb_action(), 0..40),
        streaming in any::<bool>(),
    ) {
        let mut session = ChatSession::new(
            ChatProfile::text_analyzer(),
            SessionOptions { streaming, ..SessionOptions::default() },
        );
        let mut latest = 0;

        for action in actions {
            match session.handle(to_event(action, latest)) {
                Ok(effects) => {
                    for effect in effects {
                        if let Effect::RequestResponse { request_id, .. } = effect {
                            prop_assert!(request_id > latest);
                            latest = request_id;
                        }
                    }
                }
                Err(SessionError::Transition(_)) => {}
                Err(e @ SessionError::Transcript(_)) => {
                    prop_assert!(false, "Transcript out of sync: {}", e);
                }
            }

            prop_assert_eq!(
                matches!(session.state(), ChatState::Streaming { .. }),
                session.transcript().is_streaming()
            );
            let open = session.transcript().iter().filter(|m| m.is_streaming()).count();
            prop_assert!(open <= 1);
        }

        // Each request yields at most one assistant reply
        let users = session.transcript().iter().filter(|m| m.speaker() == Speaker::User).count();
        let replies = session.transcript().len() - users;
        prop_assert!(replies <= users);
    }
}
