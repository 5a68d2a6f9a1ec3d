//! Chat message types
//!
//! A `Message` is created when a participant sends text or when an assistant
//! response begins arriving. Assistant messages move through
//! `Empty -> Streaming -> {Structured, PlainText}`; the last two are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identity
// ============================================================================

/// Opaque message identifier, assigned at creation and never reused
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

// ============================================================================
// Analysis payload
// ============================================================================

/// Sentiment classification reported by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// Kind of an extracted entity.
///
/// Labels the model invents are kept as `Unrecognized` rather than rejected,
/// and render with the `Other` style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    Company,
    Person,
    TickerSymbol,
    Product,
    Currency,
    Other,
    Unrecognized(String),
}

impl EntityKind {
    /// Wire label, as the model emits it
    pub fn label(&self) -> &str {
        match self {
            EntityKind::Company => "Company",
            EntityKind::Person => "Person",
            EntityKind::TickerSymbol => "Ticker Symbol",
            EntityKind::Product => "Product",
            EntityKind::Currency => "Currency",
            EntityKind::Other => "Other",
            EntityKind::Unrecognized(label) => label,
        }
    }

    /// Kind whose display style applies to this entity
    pub fn style(&self) -> &EntityKind {
        match self {
            EntityKind::Unrecognized(_) => &EntityKind::Other,
            known => known,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, EntityKind::Unrecognized(_))
    }
}

impl From<String> for EntityKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Company" => EntityKind::Company,
            "Person" => EntityKind::Person,
            "Ticker Symbol" | "TickerSymbol" => EntityKind::TickerSymbol,
            "Product" => EntityKind::Product,
            "Currency" => EntityKind::Currency,
            "Other" => EntityKind::Other,
            _ => EntityKind::Unrecognized(label),
        }
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Unrecognized(label) => label,
            known => known.label().to_string(),
        }
    }
}

/// An entity extracted from analyzed text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(default)]
    pub description: String,
}

/// Structured summary/sentiment/entity payload for article-like input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub summary: String,
    pub sentiment: Sentiment,
    /// In [-1.0, 1.0]
    pub sentiment_score: f64,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

// ============================================================================
// Message
// ============================================================================

/// Lifecycle of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    /// Placeholder, no fragment received yet
    Empty,
    /// Receiving fragments; text is literal partial output
    Streaming,
    /// Final, carries an analysis
    Structured,
    /// Final, conversational text
    PlainText,
}

impl MessageState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageState::Structured | MessageState::PlainText)
    }
}

/// Why an assistant response ended early
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interruption {
    Cancelled,
    TransportFailed { reason: String },
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: MessageId,
    speaker: Speaker,
    display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    analysis: Option<Analysis>,
    state: MessageState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interruption: Option<Interruption>,
    created_at: DateTime<Utc>,
}

impl Message {
    /// A message typed by the user
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            speaker: Speaker::User,
            display_text: text.into(),
            analysis: None,
            state: MessageState::PlainText,
            interruption: None,
            created_at: Utc::now(),
        }
    }

    /// A finished conversational assistant message
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::assistant_text_with_id(MessageId::new(), text)
    }

    pub(crate) fn assistant_text_with_id(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            speaker: Speaker::Assistant,
            display_text: text.into(),
            analysis: None,
            state: MessageState::PlainText,
            interruption: None,
            created_at: Utc::now(),
        }
    }

    /// A finished structured assistant message; display text is the summary
    pub(crate) fn assistant_structured(id: MessageId, analysis: Analysis) -> Self {
        Self {
            id,
            speaker: Speaker::Assistant,
            display_text: analysis.summary.clone(),
            analysis: Some(analysis),
            state: MessageState::Structured,
            interruption: None,
            created_at: Utc::now(),
        }
    }

    /// An open assistant message awaiting its first fragment
    pub(crate) fn placeholder() -> Self {
        Self {
            id: MessageId::new(),
            speaker: Speaker::Assistant,
            display_text: String::new(),
            analysis: None,
            state: MessageState::Empty,
            interruption: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    pub fn state(&self) -> MessageState {
        self.state
    }

    pub fn interruption(&self) -> Option<&Interruption> {
        self.interruption.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True while the message may still change
    pub fn is_streaming(&self) -> bool {
        !self.state.is_terminal()
    }

    pub(crate) fn push_fragment(&mut self, fragment: &str) {
        self.display_text.push_str(fragment);
        self.state = MessageState::Streaming;
    }

    pub(crate) fn into_display_text(self) -> String {
        self.display_text
    }

    pub(crate) fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub(crate) fn with_interruption(mut self, interruption: Interruption) -> Self {
        self.interruption = Some(interruption);
        self
    }
}
