//! Response reconciliation
//!
//! Turns model output into a `Message`, either from a complete response or
//! from an ordered sequence of fragments. Streamed text is always shown as
//! literal partial text; the structural reinterpretation as an `Analysis`
//! happens only once the response is complete.
//!
//! Nothing here returns an error. A response that fails to parse as an
//! analysis is an ordinary plain-text reply.

mod analysis;

#[cfg(test)]
mod proptests;

use crate::message::{Analysis, Interruption, Message, MessageId};
use analysis::{parse_analysis, unwrap_code_fence};

/// Classification of a complete response
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Structured(Analysis),
    PlainText(String),
}

/// Reconciler behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Attempt to read responses as structured analyses at all
    pub structured_replies: bool,
    /// Strip a surrounding markdown code fence before the structural parse
    pub unwrap_code_fences: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            structured_replies: true,
            unwrap_code_fences: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    /// Classify a complete response. Plain text is kept verbatim.
    pub fn classify(&self, raw: &str) -> Reply {
        if !self.config.structured_replies {
            return Reply::PlainText(raw.to_string());
        }

        let candidate = if self.config.unwrap_code_fences {
            unwrap_code_fence(raw)
        } else {
            raw
        };

        match parse_analysis(candidate) {
            Ok(analysis) => Reply::Structured(analysis),
            Err(e) => {
                tracing::debug!(error = %e, len = raw.len(), "Response is plain text");
                Reply::PlainText(raw.to_string())
            }
        }
    }

    /// Build the final message for a non-streamed response
    pub fn finalize(&self, raw: &str) -> Message {
        into_message(MessageId::new(), self.classify(raw))
    }

    /// Open a placeholder message for a streamed response
    pub fn begin_streaming(&self) -> Message {
        Message::placeholder()
    }

    /// Append a fragment in arrival order
    pub fn append_fragment(&self, mut message: Message, fragment: &str) -> Message {
        if !message.is_streaming() {
            tracing::warn!(message_id = %message.id(), "Ignoring fragment for finalized message");
            return message;
        }
        message.push_fragment(fragment);
        message
    }

    /// Close a stream, reclassifying the accumulated text. The id is preserved.
    pub fn end_streaming(&self, message: Message) -> Message {
        if !message.is_streaming() {
            tracing::warn!(message_id = %message.id(), "Stream already finalized");
            return message;
        }
        let id = message.id().clone();
        let created_at = message.created_at();
        let text = message.into_display_text();
        into_message(id, self.classify(&text)).with_created_at(created_at)
    }

    /// Finalize a stream that was aborted before its end.
    ///
    /// Whatever accumulated is classified like a finished response. If the
    /// transport failed before delivering any text, `apology` becomes the text.
    pub fn interrupt(&self, message: Message, interruption: Interruption, apology: &str) -> Message {
        if !message.is_streaming() {
            tracing::warn!(message_id = %message.id(), "Cannot interrupt finalized message");
            return message;
        }

        let failed = matches!(interruption, Interruption::TransportFailed { .. });
        let finished = if failed && message.display_text().is_empty() {
            let id = message.id().clone();
            Message::assistant_text_with_id(id, apology).with_created_at(message.created_at())
        } else {
            self.end_streaming(message)
        };
        finished.with_interruption(interruption)
    }

    /// Message for a transport failure that delivered no content
    pub fn failed(&self, reason: impl Into<String>, apology: &str) -> Message {
        Message::assistant_text(apology).with_interruption(Interruption::TransportFailed {
            reason: reason.into(),
        })
    }
}

fn into_message(id: MessageId, reply: Reply) -> Message {
    match reply {
        Reply::Structured(analysis) => Message::assistant_structured(id, analysis),
        Reply::PlainText(text) => Message::assistant_text_with_id(id, text),
    }
}
