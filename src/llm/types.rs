//! Common types for model interactions

use super::ModelError;
use futures::stream::Stream;
use std::pin::Pin;

/// Request for one assistant reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub system: String,
    /// Prior turns, oldest first
    pub history: Vec<ModelTurn>,
    /// The new user text
    pub prompt: String,
}

/// A prior turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTurn {
    pub role: MessageRole,
    pub text: String,
}

impl ModelTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Model,
            text: text.into(),
        }
    }
}

/// Turn role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Model,
}

/// Complete model reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: String,
}

/// Ordered text fragments, ended by the stream finishing or yielding an error
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;
