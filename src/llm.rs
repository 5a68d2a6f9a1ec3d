//! Model service boundary
//!
//! The hosted model is a black box that answers a request either with a
//! complete reply or with an ordered stream of text fragments.

mod error;
mod scripted;
mod types;

pub use error::{ModelError, ModelErrorKind};
pub use scripted::{Script, ScriptedService};
pub use types::*;

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;

/// Common interface for model providers
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Request a complete reply
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError>;

    /// Request a streamed reply
    async fn stream(&self, request: &ModelRequest) -> Result<FragmentStream, ModelError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ModelService + ?Sized> ModelService for Arc<T> {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        (**self).complete(request).await
    }

    async fn stream(&self, request: &ModelRequest) -> Result<FragmentStream, ModelError> {
        (**self).stream(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for model services
pub struct LoggingService<S> {
    inner: S,
    model_id: String,
}

impl<S: ModelService> LoggingService<S> {
    pub fn new(inner: S) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl<S: ModelService> ModelService for LoggingService<S> {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let start = Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    history = request.history.len(),
                    response_len = response.text.len(),
                    "Model request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    transient = e.kind.is_transient(),
                    "Model request failed"
                );
            }
        }

        result
    }

    async fn stream(&self, request: &ModelRequest) -> Result<FragmentStream, ModelError> {
        let start = Instant::now();
        let model_id = self.model_id.clone();

        match self.inner.stream(request).await {
            Ok(stream) => {
                tracing::info!(
                    model = %model_id,
                    duration_ms = %start.elapsed().as_millis(),
                    history = request.history.len(),
                    "Model stream opened"
                );
                let logged = stream.inspect(move |item| {
                    if let Err(e) = item {
                        tracing::error!(
                            model = %model_id,
                            duration_ms = %start.elapsed().as_millis(),
                            error = %e.message,
                            kind = ?e.kind,
                            "Model stream failed"
                        );
                    }
                });
                Ok(Box::pin(logged))
            }
            Err(e) => {
                tracing::error!(
                    model = %model_id,
                    duration_ms = %start.elapsed().as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    transient = e.kind.is_transient(),
                    "Model stream could not be opened"
                );
                Err(e)
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
