//! Chat profiles
//!
//! Each chat view runs a session with its own system instruction, greeting,
//! apology text and reply handling.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Instruction for the text analyzer: JSON analyses for articles, prose otherwise
const ANALYZER_INSTRUCTION: &str = r#"You are a helpful and expert financial assistant named 'FinAI'. Your goal is to analyze financial text, provide insights, and answer questions.

When a user provides a block of text that seems like a financial news article, report, or analysis, you MUST respond with ONLY a valid JSON object. Do not add any text, markdown, or commentary before or after the JSON. The JSON object must have the following structure:
{
  "summary": "A concise summary of the provided text.",
  "sentiment": "A sentiment classification from one of the following options: 'Positive', 'Negative', 'Neutral'.",
  "sentimentScore": "A numerical score between -1.0 (very negative) and 1.0 (very positive).",
  "entities": [
    {
      "name": "The name of the extracted entity (e.g., 'Apple Inc.', 'AAPL', 'Tim Cook').",
      "type": "The type of entity. Must be one of: 'Company', 'Person', 'Ticker Symbol', 'Product', 'Currency', 'Other'.",
      "description": "A brief, one-sentence description of the entity's relevance in the article."
    }
  ]
}

For any other query, such as a simple question (e.g., "What is a P/E ratio?"), a follow-up question about a previous analysis, or a conversational greeting, you MUST respond with a helpful, conversational answer in plain text. Do NOT use JSON for these responses.

You must not provide financial advice that could be construed as professional investment advice for specific individuals. Always preface advice with a disclaimer that you are an AI assistant and users should consult with a human financial advisor for personalized advice."#;

const SUPPORT_INSTRUCTION: &str = r"You are the FinAI virtual support assistant. Help customers with questions about their account, transactions, and general financial topics.

Answer in friendly, concise plain text. Never ask for passwords, full card numbers, or other credentials. If a request needs access to account data you do not have, explain how the customer can reach a human agent.

You must not provide personalized investment advice; remind users to consult a human financial advisor when appropriate.";

/// Which chat view a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    #[default]
    TextAnalyzer,
    CustomerService,
}

impl FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text-analyzer" | "analyzer" => Ok(ProfileKind::TextAnalyzer),
            "customer-service" | "support" => Ok(ProfileKind::CustomerService),
            other => Err(format!("unknown profile: {other}")),
        }
    }
}

/// Everything a chat view configures about its session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatProfile {
    pub kind: ProfileKind,
    pub system_instruction: &'static str,
    /// Assistant message seeded into a fresh transcript
    pub greeting: Option<&'static str>,
    /// Shown in place of a reply when the transport delivers nothing
    pub apology: &'static str,
    /// Prefix of the error banner shown after a transport failure
    pub error_prefix: &'static str,
    /// Whether replies may be structured analyses
    pub structured_replies: bool,
    /// Canned prompts offered on an empty transcript
    pub suggestions: &'static [&'static str],
}

impl ChatProfile {
    pub fn for_kind(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::TextAnalyzer => Self::text_analyzer(),
            ProfileKind::CustomerService => Self::customer_service(),
        }
    }

    pub fn text_analyzer() -> Self {
        Self {
            kind: ProfileKind::TextAnalyzer,
            system_instruction: ANALYZER_INSTRUCTION,
            greeting: None,
            apology: "Sorry, I encountered an error. Please try again.",
            error_prefix: "Failed to get response from AI.",
            structured_replies: true,
            suggestions: &["Analyze latest market news", "What is a stock split?"],
        }
    }

    pub fn customer_service() -> Self {
        Self {
            kind: ProfileKind::CustomerService,
            system_instruction: SUPPORT_INSTRUCTION,
            greeting: Some(
                "Welcome to FinAI Support! How can I help you today? You can ask about your account, transactions, or general financial topics.",
            ),
            apology: "Sorry, I'm having trouble connecting right now. Please try again in a moment.",
            error_prefix: "Failed to get response from AI assistant.",
            structured_replies: false,
            suggestions: &[],
        }
    }

    /// Error banner for a transport failure
    pub fn error_banner(&self, message: &str) -> String {
        format!("{} {message}", self.error_prefix)
    }
}
