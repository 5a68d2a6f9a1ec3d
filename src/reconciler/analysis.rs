//! Structural parse of model output into an `Analysis`

use crate::message::Analysis;
use serde_json::Value;
use thiserror::Error;

/// Reasons a response is not a structured analysis. Never surfaced to users.
#[derive(Debug, Error)]
pub(crate) enum AnalysisError {
    #[error("not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("JSON value is not an object")]
    NotAnObject,
    #[error("object does not match analysis shape: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("sentimentScore {0} outside [-1, 1]")]
    ScoreOutOfRange(f64),
}

/// Parse `text` as an analysis object
pub(crate) fn parse_analysis(text: &str) -> Result<Analysis, AnalysisError> {
    let value: Value = serde_json::from_str(text.trim()).map_err(AnalysisError::NotJson)?;
    if !value.is_object() {
        return Err(AnalysisError::NotAnObject);
    }

    let analysis: Analysis = serde_json::from_value(value).map_err(AnalysisError::Shape)?;
    let score = analysis.sentiment_score;
    if !score.is_finite() || !(-1.0..=1.0).contains(&score) {
        return Err(AnalysisError::ScoreOutOfRange(score));
    }

    Ok(analysis)
}

/// Strip one surrounding markdown code fence (```` ``` ```` or ```` ```json ````)
pub(crate) fn unwrap_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the first newline
    match body.split_once('\n') {
        Some((info, inner)) if !info.contains('{') => inner,
        _ => body,
    }
}
