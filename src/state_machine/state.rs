//! Chat session state types

use serde::{Deserialize, Serialize};

/// Session state. At most one request is outstanding at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// Ready for user input
    #[default]
    Idle,

    /// Request sent, nothing received yet
    AwaitingResponse { request_id: u64 },

    /// Fragments arriving into the open assistant message
    Streaming { request_id: u64 },

    /// Last exchange failed in transport; accepts a new message
    Error { message: String },
}

impl ChatState {
    /// True while a request is outstanding and new sends are refused
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ChatState::AwaitingResponse { .. } | ChatState::Streaming { .. }
        )
    }

    /// Request currently in flight
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ChatState::AwaitingResponse { request_id } | ChatState::Streaming { request_id } => {
                Some(*request_id)
            }
            ChatState::Idle | ChatState::Error { .. } => None,
        }
    }

    /// Short name used in logs and notifications
    pub fn name(&self) -> &'static str {
        match self {
            ChatState::Idle => "idle",
            ChatState::AwaitingResponse { .. } => "awaiting_response",
            ChatState::Streaming { .. } => "streaming",
            ChatState::Error { .. } => "error",
        }
    }
}

/// Context the transition function reads but never changes
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    /// Deliver responses as fragment streams
    pub streaming: bool,
    /// Id the next request will get
    pub next_request_id: u64,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, streaming: bool) -> Self {
        Self {
            session_id: session_id.into(),
            streaming,
            next_request_id: 1,
        }
    }
}
