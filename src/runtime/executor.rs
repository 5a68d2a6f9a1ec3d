//! Chat runtime executor

use crate::llm::{FragmentStream, ModelError, ModelService};
use crate::session::{ChatSession, SessionError};
use crate::state_machine::{Effect, Event};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

/// What the transport produced while racing cancellation
enum Outcome<T> {
    Cancelled,
    Done(T),
}

/// Drives one session against a model service, one exchange at a time
pub struct ChatRuntime<M: ModelService> {
    session: ChatSession,
    model: M,
}

impl<M: ModelService> ChatRuntime<M> {
    pub fn new(session: ChatSession, model: M) -> Self {
        Self { session, model }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn into_session(self) -> ChatSession {
        self.session
    }

    /// Send a message and wait for the exchange to settle
    pub async fn send(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send_with_cancel(text, CancellationToken::new()).await
    }

    /// Send a message; cancelling `cancel` ends the exchange early and keeps
    /// whatever text has arrived.
    #[allow(clippy::needless_pass_by_value)] // Token is owned by the exchange
    pub async fn send_with_cancel(
        &mut self,
        text: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<(), SessionError> {
        let effects = self.session.handle(Event::UserMessage { text: text.into() })?;

        for effect in effects {
            if let Effect::RequestResponse {
                request_id,
                streaming,
            } = effect
            {
                if streaming {
                    self.stream_exchange(request_id, &cancel).await?;
                } else {
                    self.complete_exchange(request_id, &cancel).await?;
                }
            }
        }

        Ok(())
    }

    async fn complete_exchange(
        &mut self,
        request_id: u64,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        let Some(request) = self.session.build_request() else {
            return self.abandon(request_id);
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Outcome::Cancelled,
            result = self.model.complete(&request) => Outcome::Done(result),
        };

        let event = match outcome {
            Outcome::Cancelled => return self.cancel(request_id),
            Outcome::Done(Ok(response)) => Event::ResponseComplete {
                request_id,
                text: response.text,
            },
            Outcome::Done(Err(e)) => failed(request_id, &e),
        };
        self.dispatch(event)
    }

    async fn stream_exchange(
        &mut self,
        request_id: u64,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        let Some(request) = self.session.build_request() else {
            return self.abandon(request_id);
        };

        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => Outcome::Cancelled,
            result = self.model.stream(&request) => Outcome::Done(result),
        };

        let mut stream: FragmentStream = match opened {
            Outcome::Cancelled => return self.cancel(request_id),
            Outcome::Done(Ok(stream)) => stream,
            Outcome::Done(Err(e)) => return self.dispatch(failed(request_id, &e)),
        };

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => Outcome::Cancelled,
                item = stream.next() => Outcome::Done(item),
            };

            match next {
                // Dropping the stream aborts the transport
                Outcome::Cancelled => return self.cancel(request_id),
                Outcome::Done(Some(Ok(text))) => {
                    self.dispatch(Event::Fragment { request_id, text })?;
                }
                Outcome::Done(Some(Err(e))) => return self.dispatch(failed(request_id, &e)),
                Outcome::Done(None) => return self.dispatch(Event::StreamEnded { request_id }),
            }
        }
    }

    /// Settle a request that could not be sent
    fn abandon(&mut self, request_id: u64) -> Result<(), SessionError> {
        tracing::warn!(session_id = %self.session.session_id(), request_id, "No pending message to send");
        self.dispatch(Event::TransportFailed {
            request_id,
            message: "No pending message to send".to_string(),
        })
    }

    fn cancel(&mut self, request_id: u64) -> Result<(), SessionError> {
        tracing::info!(session_id = %self.session.session_id(), request_id, "Model request cancelled");
        self.dispatch(Event::UserCancel)
    }

    fn dispatch(&mut self, event: Event) -> Result<(), SessionError> {
        for effect in self.session.handle(event)? {
            // Requests are only issued by `send_with_cancel`; aborts happen by
            // dropping the transport future.
            tracing::debug!(?effect, "Transport effect handled by caller");
        }
        Ok(())
    }
}

fn failed(request_id: u64, error: &ModelError) -> Event {
    Event::TransportFailed {
        request_id,
        message: error.message.clone(),
    }
}
