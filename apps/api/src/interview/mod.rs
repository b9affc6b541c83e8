//! Interview lifecycle: per-candidate session state machine, question
//! generation with deterministic degradation, and tolerant evaluation parsing.

pub mod engine;
pub mod evaluation;
pub mod handlers;
pub mod prompts;
pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question/answer exchange. The answer is empty until the candidate
/// responds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// A policy violation observed by the proctoring layer during the interview
/// (e.g. tab switch, paste burst). Accumulated per session, never reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub name: String,
    pub timestamp: DateTime<Utc>,
}
