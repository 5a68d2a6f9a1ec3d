//! Effects produced by state transitions

use crate::message::Interruption;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append the user's message to the transcript
    RecordUserMessage { text: String },

    /// Ask the model for a response
    RequestResponse { request_id: u64, streaming: bool },

    /// Abort the in-flight model request
    AbortRequest { request_id: u64 },

    /// Open the streaming assistant message
    BeginAssistantMessage,

    /// Append a fragment to the streaming message
    AppendFragment { text: String },

    /// Reconcile a complete response into a new assistant message
    FinalizeResponse { text: String },

    /// Reconcile the accumulated stream into its final message
    EndStream,

    /// Finalize the streaming message early
    AbortStream { interruption: Interruption },

    /// Record the apology for a request that produced nothing
    RecordFailure { reason: String },
}

impl Effect {
    /// Effects the transport driver must carry out; the rest touch only the transcript
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Effect::RequestResponse { .. } | Effect::AbortRequest { .. }
        )
    }

    pub fn cancelled_stream() -> Self {
        Effect::AbortStream {
            interruption: Interruption::Cancelled,
        }
    }

    pub fn failed_stream(reason: impl Into<String>) -> Self {
        Effect::AbortStream {
            interruption: Interruption::TransportFailed {
                reason: reason.into(),
            },
        }
    }
}
