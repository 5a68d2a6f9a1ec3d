//! Ordered conversation transcript
//!
//! Settled messages are append-only. The one message that may still change
//! (an assistant reply being streamed) is held apart from them, so there can
//! never be more than one.

use crate::message::{Message, MessageId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("A response is still streaming")]
    StreamInProgress,
    #[error("No response is streaming")]
    NoStreamingMessage,
    #[error("Message {0} is still open; use begin_streaming")]
    NotFinalized(MessageId),
    #[error("Message {0} is already finalized")]
    AlreadyFinalized(MessageId),
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    settled: Vec<Message>,
    streaming: Option<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized message
    pub fn push(&mut self, message: Message) -> Result<&Message, TranscriptError> {
        if self.streaming.is_some() {
            return Err(TranscriptError::StreamInProgress);
        }
        if message.is_streaming() {
            return Err(TranscriptError::NotFinalized(message.id().clone()));
        }
        let index = self.settled.len();
        self.settled.push(message);
        Ok(&self.settled[index])
    }

    /// Open the streaming slot with a placeholder message
    pub fn begin_streaming(&mut self, message: Message) -> Result<&Message, TranscriptError> {
        if self.streaming.is_some() {
            return Err(TranscriptError::StreamInProgress);
        }
        if !message.is_streaming() {
            return Err(TranscriptError::AlreadyFinalized(message.id().clone()));
        }
        Ok(self.streaming.insert(message))
    }

    /// Replace the streaming message with `f(message)`
    pub fn update_streaming(
        &mut self,
        f: impl FnOnce(Message) -> Message,
    ) -> Result<&Message, TranscriptError> {
        let message = self.streaming.take().ok_or(TranscriptError::NoStreamingMessage)?;
        Ok(self.streaming.insert(f(message)))
    }

    /// Finalize the streaming message with `f` and move it to the settled list
    pub fn settle_streaming(
        &mut self,
        f: impl FnOnce(Message) -> Message,
    ) -> Result<&Message, TranscriptError> {
        let message = self.streaming.take().ok_or(TranscriptError::NoStreamingMessage)?;
        let message = f(message);
        if message.is_streaming() {
            let id = message.id().clone();
            self.streaming = Some(message);
            return Err(TranscriptError::NotFinalized(id));
        }
        let index = self.settled.len();
        self.settled.push(message);
        Ok(&self.settled[index])
    }

    pub fn streaming(&self) -> Option<&Message> {
        self.streaming.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.is_some()
    }

    /// Finalized messages only
    pub fn settled(&self) -> &[Message] {
        &self.settled
    }

    /// All messages in display order
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.settled.iter().chain(self.streaming.iter())
    }

    pub fn last(&self) -> Option<&Message> {
        self.streaming.as_ref().or_else(|| self.settled.last())
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.iter().find(|m| m.id() == id)
    }

    pub fn len(&self) -> usize {
        self.settled.len() + usize::from(self.streaming.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
