//! `FinAI` - replay a model reply through a chat session
//!
//! Reads a raw model response on stdin, runs it through a session as if the
//! model had sent it, and prints the resulting transcript as JSON lines.

use finai::config::AppConfig;
use finai::llm::{LoggingService, Script, ScriptedService};
use finai::profile::ChatProfile;
use finai::runtime::ChatRuntime;
use finai::session::ChatSession;
use std::io::{Read, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PROMPT: &str = "Analyze this text.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finai=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::from_env()?;

    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;

    let script = if config.streaming {
        Script::chunked(&raw, config.fragment_size)
    } else {
        Script::Complete(raw)
    };
    let model = LoggingService::new(ScriptedService::new(config.model.clone()).with(script));

    let session = ChatSession::new(ChatProfile::for_kind(config.profile), config.session_options());
    tracing::info!(
        session_id = %session.session_id(),
        profile = ?config.profile,
        streaming = config.streaming,
        model = %config.model,
        "Replaying response"
    );

    let mut runtime = ChatRuntime::new(session, model);
    let prompt = config.prompt.as_deref().unwrap_or(DEFAULT_PROMPT);
    runtime.send(prompt).await?;

    let session = runtime.into_session();
    if let Some(banner) = session.last_error() {
        tracing::warn!(banner, "Exchange failed");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for message in session.transcript().iter() {
        serde_json::to_writer(&mut out, message)?;
        writeln!(out)?;
    }

    Ok(())
}
