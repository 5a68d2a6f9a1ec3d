//! `FinAI` chat core
//!
//! Session, transcript and response reconciliation for a financial-analysis
//! chat assistant backed by a hosted language model.

pub mod config;
pub mod llm;
pub mod message;
pub mod profile;
pub mod reconciler;
pub mod runtime;
pub mod session;
pub mod state_machine;
pub mod transcript;
