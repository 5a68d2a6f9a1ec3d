//! Chat session
//!
//! One session per chat view, created and dropped with it. The session owns
//! the transcript and applies the effects of each state transition to it;
//! effects that need the transport are handed back to the caller.

use crate::llm::{ModelRequest, ModelTurn};
use crate::message::{Message, Speaker};
use crate::profile::ChatProfile;
use crate::reconciler::{Reconciler, ReconcilerConfig};
use crate::state_machine::{transition, ChatState, Effect, Event, SessionContext, TransitionError};
use crate::transcript::{Transcript, TranscriptError};
use thiserror::Error;
use tokio::sync::broadcast;

const UPDATE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Transcript out of sync: {0}")]
    Transcript(#[from] TranscriptError),
}

/// Changes pushed to whatever renders the session
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    MessageAdded { message: Message },
    MessageUpdated { message: Message },
    StateChange { state: ChatState },
    Error { message: String },
}

/// Session options that do not come from the profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Ask for fragment streams instead of complete replies
    pub streaming: bool,
    pub unwrap_code_fences: bool,
}

pub struct ChatSession {
    context: SessionContext,
    state: ChatState,
    profile: ChatProfile,
    reconciler: Reconciler,
    transcript: Transcript,
    last_error: Option<String>,
    updates: broadcast::Sender<SessionUpdate>,
}

impl ChatSession {
    pub fn new(profile: ChatProfile, options: SessionOptions) -> Self {
        let reconciler = Reconciler::new(ReconcilerConfig {
            structured_replies: profile.structured_replies,
            unwrap_code_fences: options.unwrap_code_fences,
        });

        let mut transcript = Transcript::new();
        if let Some(greeting) = profile.greeting {
            // A fresh transcript has no open stream, so this cannot fail
            let _ = transcript.push(Message::assistant_text(greeting));
        }

        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let context = SessionContext::new(uuid::Uuid::new_v4().to_string(), options.streaming);
        tracing::debug!(session_id = %context.session_id, profile = ?profile.kind, "Session created");

        Self {
            context,
            state: ChatState::Idle,
            profile,
            reconciler,
            transcript,
            last_error: None,
            updates,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn profile(&self) -> &ChatProfile {
        &self.profile
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Banner describing the last transport failure, cleared by the next send
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Canned prompts, offered only until the user has said something
    pub fn suggestions(&self) -> &'static [&'static str] {
        if self.transcript.iter().any(|m| m.speaker() == Speaker::User) {
            &[]
        } else {
            self.profile.suggestions
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    /// Feed an event through the state machine.
    ///
    /// Returns the transport effects (`RequestResponse`, `AbortRequest`) the
    /// caller must carry out.
    pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>, SessionError> {
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                let _ = self.updates.send(SessionUpdate::Error {
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        if result.effects.is_empty() && result.new_state == self.state {
            tracing::debug!(
                session_id = %self.context.session_id,
                state = self.state.name(),
                "Discarded event"
            );
            return Ok(vec![]);
        }

        let old_state = std::mem::replace(&mut self.state, result.new_state);

        let mut transport = Vec::new();
        for effect in result.effects {
            if effect.is_transport() {
                if let Effect::RequestResponse { request_id, .. } = effect {
                    self.context.next_request_id = request_id + 1;
                }
                transport.push(effect);
            } else {
                self.apply(effect)?;
            }
        }

        if old_state != self.state {
            tracing::debug!(
                session_id = %self.context.session_id,
                from = old_state.name(),
                to = self.state.name(),
                "State changed"
            );
            if let ChatState::Error { message } = &self.state {
                let banner = self.profile.error_banner(message);
                let _ = self.updates.send(SessionUpdate::Error {
                    message: banner.clone(),
                });
                self.last_error = Some(banner);
            }
            let _ = self.updates.send(SessionUpdate::StateChange {
                state: self.state.clone(),
            });
        }

        Ok(transport)
    }

    /// Apply a transcript effect
    fn apply(&mut self, effect: Effect) -> Result<(), TranscriptError> {
        let reconciler = &self.reconciler;
        let apology = self.profile.apology;

        let update = match effect {
            Effect::RecordUserMessage { text } => {
                self.last_error = None;
                let message = self.transcript.push(Message::user(text))?;
                SessionUpdate::MessageAdded {
                    message: message.clone(),
                }
            }
            Effect::BeginAssistantMessage => {
                let message = self.transcript.begin_streaming(reconciler.begin_streaming())?;
                SessionUpdate::MessageAdded {
                    message: message.clone(),
                }
            }
            Effect::AppendFragment { text } => {
                let message = self
                    .transcript
                    .update_streaming(|m| reconciler.append_fragment(m, &text))?;
                SessionUpdate::MessageUpdated {
                    message: message.clone(),
                }
            }
            Effect::FinalizeResponse { text } => {
                let message = self.transcript.push(reconciler.finalize(&text))?;
                SessionUpdate::MessageAdded {
                    message: message.clone(),
                }
            }
            Effect::EndStream => {
                let message = self
                    .transcript
                    .settle_streaming(|m| reconciler.end_streaming(m))?;
                SessionUpdate::MessageUpdated {
                    message: message.clone(),
                }
            }
            Effect::AbortStream { interruption } => {
                let message = self
                    .transcript
                    .settle_streaming(|m| reconciler.interrupt(m, interruption, apology))?;
                SessionUpdate::MessageUpdated {
                    message: message.clone(),
                }
            }
            Effect::RecordFailure { reason } => {
                let message = self.transcript.push(reconciler.failed(reason, apology))?;
                SessionUpdate::MessageAdded {
                    message: message.clone(),
                }
            }
            Effect::RequestResponse { .. } | Effect::AbortRequest { .. } => return Ok(()),
        };

        let _ = self.updates.send(update);
        Ok(())
    }

    /// Request for the pending user message, if one is waiting for a reply
    pub fn build_request(&self) -> Option<ModelRequest> {
        let (prompt, earlier) = self.transcript.settled().split_last()?;
        if prompt.speaker() != Speaker::User {
            return None;
        }

        // Only exchanges that completed are replayed; a prompt whose reply
        // failed, was cut short or never came goes with it.
        let answered = |i: usize| {
            earlier
                .get(i + 1)
                .is_some_and(|r| r.speaker() == Speaker::Assistant && r.interruption().is_none())
        };
        let history = earlier
            .iter()
            .enumerate()
            .filter(|&(i, m)| match m.speaker() {
                Speaker::User => answered(i),
                Speaker::Assistant => m.interruption().is_none(),
            })
            .map(|(_, m)| match m.speaker() {
                Speaker::User => ModelTurn::user(m.display_text()),
                Speaker::Assistant => ModelTurn::model(model_text(m)),
            })
            .collect();

        Some(ModelRequest {
            system: self.profile.system_instruction.to_string(),
            history,
            prompt: prompt.display_text().to_string(),
        })
    }
}

/// What the model said, for replaying history: analyses go back as their JSON
fn model_text(message: &Message) -> String {
    match message.analysis() {
        Some(analysis) => serde_json::to_string(analysis)
            .unwrap_or_else(|_| message.display_text().to_string()),
        None => message.display_text().to_string(),
    }
}
