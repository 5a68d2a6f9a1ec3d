//! Application configuration from environment variables

use crate::profile::ProfileKind;
use crate::session::SessionOptions;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_FRAGMENT_SIZE: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub profile: ProfileKind,
    pub streaming: bool,
    /// Chars per fragment when replaying a reply as a stream
    pub fragment_size: usize,
    pub unwrap_code_fences: bool,
    pub model: String,
    /// User text for the replayed exchange
    pub prompt: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: ProfileKind::default(),
            streaming: false,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
            unwrap_code_fences: false,
            model: DEFAULT_MODEL.to_string(),
            prompt: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(profile) = lookup("FINAI_PROFILE") {
            config.profile = profile
                .parse()
                .map_err(|e: String| ConfigError::invalid("FINAI_PROFILE", e))?;
        }
        if let Some(streaming) = lookup("FINAI_STREAMING") {
            config.streaming = parse_flag("FINAI_STREAMING", &streaming)?;
        }
        if let Some(size) = lookup("FINAI_FRAGMENT_SIZE") {
            config.fragment_size = match size.trim().parse::<usize>() {
                Ok(0) => return Err(ConfigError::invalid("FINAI_FRAGMENT_SIZE", "must be positive")),
                Ok(n) => n,
                Err(e) => return Err(ConfigError::invalid("FINAI_FRAGMENT_SIZE", e.to_string())),
            };
        }
        if let Some(unwrap) = lookup("FINAI_UNWRAP_FENCES") {
            config.unwrap_code_fences = parse_flag("FINAI_UNWRAP_FENCES", &unwrap)?;
        }
        if let Some(model) = lookup("FINAI_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model;
        }
        config.prompt = lookup("FINAI_PROMPT").filter(|p| !p.trim().is_empty());

        Ok(config)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            streaming: self.streaming,
            unwrap_code_fences: self.unwrap_code_fences,
        }
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::invalid(var, format!("not a boolean: {other}"))),
    }
}
