//! Pure state transition function

use super::{ChatState, Effect, Event, SessionContext};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Event ignored; state unchanged, nothing to do
    fn discard(state: &ChatState) -> Self {
        Self::new(state.clone())
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A response is still pending, wait for it or cancel first")]
    Busy,
    #[error("Message is empty")]
    EmptyMessage,
}

/// Pure transition function.
///
/// Given the same inputs it always produces the same outputs; all transcript
/// and transport work is described by the returned effects.
pub fn transition(
    state: &ChatState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User messages
        // ============================================================
        (ChatState::Idle | ChatState::Error { .. }, Event::UserMessage { text }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyMessage);
            }
            let request_id = context.next_request_id;
            Ok(TransitionResult::new(ChatState::AwaitingResponse { request_id })
                .with_effect(Effect::RecordUserMessage { text })
                .with_effect(Effect::RequestResponse {
                    request_id,
                    streaming: context.streaming,
                }))
        }

        (ChatState::AwaitingResponse { .. } | ChatState::Streaming { .. }, Event::UserMessage { .. }) => {
            Err(TransitionError::Busy)
        }

        // ============================================================
        // Cancellation
        // ============================================================
        (ChatState::AwaitingResponse { request_id }, Event::UserCancel) => {
            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::AbortRequest { request_id: *request_id }))
        }

        (ChatState::Streaming { request_id }, Event::UserCancel) => {
            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::AbortRequest { request_id: *request_id })
                .with_effect(Effect::cancelled_stream()))
        }

        (ChatState::Idle | ChatState::Error { .. }, Event::UserCancel) => {
            Ok(TransitionResult::discard(state))
        }

        // ============================================================
        // Transport events for a request no longer in flight
        // ============================================================
        (_, event) if event.request_id() != state.request_id() => {
            Ok(TransitionResult::discard(state))
        }

        // ============================================================
        // Complete responses
        // ============================================================
        (ChatState::AwaitingResponse { .. }, Event::ResponseComplete { text, .. }) => {
            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::FinalizeResponse { text }))
        }

        // A stream never answers with a complete response
        (ChatState::Streaming { .. }, Event::ResponseComplete { .. }) => {
            Ok(TransitionResult::discard(state))
        }

        // ============================================================
        // Streamed responses
        // ============================================================
        (ChatState::AwaitingResponse { request_id }, Event::Fragment { text, .. }) => {
            Ok(TransitionResult::new(ChatState::Streaming { request_id: *request_id })
                .with_effect(Effect::BeginAssistantMessage)
                .with_effect(Effect::AppendFragment { text }))
        }

        (ChatState::Streaming { .. }, Event::Fragment { text, .. }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::AppendFragment { text }))
        }

        // Stream closed without a single fragment: an empty reply
        (ChatState::AwaitingResponse { .. }, Event::StreamEnded { .. }) => {
            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::BeginAssistantMessage)
                .with_effect(Effect::EndStream))
        }

        (ChatState::Streaming { .. }, Event::StreamEnded { .. }) => {
            Ok(TransitionResult::new(ChatState::Idle).with_effect(Effect::EndStream))
        }

        // ============================================================
        // Transport failures
        // ============================================================
        (ChatState::AwaitingResponse { .. }, Event::TransportFailed { message, .. }) => {
            Ok(TransitionResult::new(ChatState::Error {
                message: message.clone(),
            })
            .with_effect(Effect::RecordFailure { reason: message }))
        }

        (ChatState::Streaming { .. }, Event::TransportFailed { message, .. }) => {
            Ok(TransitionResult::new(ChatState::Error {
                message: message.clone(),
            })
            .with_effect(Effect::failed_stream(message)))
        }

        // Idle/Error only see transport events with a request id, which the
        // mismatch arm above already discarded.
        (ChatState::Idle | ChatState::Error { .. }, _) => Ok(TransitionResult::discard(state)),
    }
}
