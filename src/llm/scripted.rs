//! Model service that replays queued replies
//!
//! Stands in for the hosted model when replaying captured output and in tests.

use super::{FragmentStream, ModelError, ModelRequest, ModelResponse, ModelService};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Script {
    /// Whole reply; streamed as a single fragment
    Complete(String),
    /// Reply delivered as these fragments; completes as their concatenation
    Fragments(Vec<String>),
    /// Request fails before any content
    Fail(ModelError),
    /// Stream yields the fragments, then fails
    FailAfter {
        fragments: Vec<String>,
        error: ModelError,
    },
    /// Stream yields the fragments, then never finishes
    Stall { fragments: Vec<String> },
}

impl Script {
    /// Split `text` into fragments of at most `size` chars
    pub fn chunked(text: &str, size: usize) -> Self {
        let size = size.max(1);
        let chars: Vec<char> = text.chars().collect();
        Script::Fragments(chars.chunks(size).map(|c| c.iter().collect()).collect())
    }
}

/// Serves queued scripts in order, one per request
pub struct ScriptedService {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ModelRequest>>,
    model_id: String,
}

impl ScriptedService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            model_id: model_id.into(),
        }
    }

    /// Queue a reply
    pub fn push(&self, script: Script) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(script);
    }

    #[must_use]
    pub fn with(self, script: Script) -> Self {
        self.push(script);
        self
    }

    /// Requests received so far
    pub fn recorded_requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next(&self, request: &ModelRequest) -> Option<Script> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

fn exhausted() -> ModelError {
    ModelError::unknown("No scripted response queued")
}

#[async_trait]
impl ModelService for ScriptedService {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        match self.next(request).ok_or_else(exhausted)? {
            Script::Complete(text) => Ok(ModelResponse { text }),
            Script::Fragments(fragments) => Ok(ModelResponse {
                text: fragments.concat(),
            }),
            Script::Fail(error) | Script::FailAfter { error, .. } => Err(error),
            Script::Stall { .. } => futures::future::pending().await,
        }
    }

    async fn stream(&self, request: &ModelRequest) -> Result<FragmentStream, ModelError> {
        let stream: FragmentStream = match self.next(request).ok_or_else(exhausted)? {
            Script::Complete(text) => Box::pin(stream::iter([Ok::<_, ModelError>(text)])),
            Script::Fragments(fragments) => {
                Box::pin(stream::iter(fragments.into_iter().map(Ok::<_, ModelError>)))
            }
            Script::Fail(error) => return Err(error),
            Script::FailAfter { fragments, error } => Box::pin(stream::iter(
                fragments
                    .into_iter()
                    .map(Ok::<_, ModelError>)
                    .chain(std::iter::once(Err(error))),
            )),
            Script::Stall { fragments } => Box::pin(
                stream::iter(fragments.into_iter().map(Ok::<_, ModelError>)).chain(stream::pending()),
            ),
        };
        Ok(stream)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
