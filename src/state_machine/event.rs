//! Events that can occur in a chat session

/// Events that trigger state transitions.
///
/// Transport events carry the `request_id` of the exchange they belong to so
/// that output from a cancelled request is recognized and dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
    },
    UserCancel,

    // Transport events
    ResponseComplete {
        request_id: u64,
        text: String,
    },
    Fragment {
        request_id: u64,
        text: String,
    },
    StreamEnded {
        request_id: u64,
    },
    TransportFailed {
        request_id: u64,
        message: String,
    },
}

impl Event {
    /// Request this event answers, if it is a transport event
    pub fn request_id(&self) -> Option<u64> {
        match self {
            Event::UserMessage { .. } | Event::UserCancel => None,
            Event::ResponseComplete { request_id, .. }
            | Event::Fragment { request_id, .. }
            | Event::StreamEnded { request_id }
            | Event::TransportFailed { request_id, .. } => Some(*request_id),
        }
    }
}
