//! Job matching capability and match-score extraction.
//!
//! The matcher returns free text; the score lives behind a literal
//! `OVERALL MATCH SCORE: <n>%` marker. Extraction is best-effort and
//! deliberately isolated behind [`ScoreExtractor`] so the strategy can be
//! swapped without touching the orchestrator when the prompt wording drifts.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::capabilities::prompts::MATCH_PROMPT_TEMPLATE;
use crate::dispatch::Capability;
use crate::errors::AppError;
use crate::llm_client::prompts::RECRUITMENT_SYSTEM;
use crate::llm_client::Generate;

pub const TASK_MATCH_CV: &str = "match_cv";

pub struct JobMatchCapability {
    llm: Arc<dyn Generate>,
}

#[derive(Debug, Deserialize)]
struct MatchRequest {
    cv_summary: String,
    job_summary: String,
}

impl JobMatchCapability {
    pub fn new(llm: Arc<dyn Generate>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Capability for JobMatchCapability {
    fn name(&self) -> &str {
        "job_matcher"
    }

    fn can_handle(&self, task: &str) -> bool {
        task == TASK_MATCH_CV
    }

    async fn perform(&self, _task: &str, payload: Value) -> Result<Value, AppError> {
        let request: MatchRequest = serde_json::from_value(payload).map_err(|_| {
            AppError::MissingInput("Missing cv_summary or job_summary".to_string())
        })?;
        if request.cv_summary.trim().is_empty() || request.job_summary.trim().is_empty() {
            return Err(AppError::MissingInput(
                "Missing cv_summary or job_summary".to_string(),
            ));
        }

        let prompt = MATCH_PROMPT_TEMPLATE
            .replace("{cv_summary}", &request.cv_summary)
            .replace("{job_summary}", &request.job_summary);

        let analysis = self
            .llm
            .complete(&prompt, RECRUITMENT_SYSTEM)
            .await
            .map_err(|e| AppError::Upstream(format!("job matching failed: {e}")))?;

        Ok(json!({ "analysis": analysis }))
    }
}

/// Pulls a match score out of free-text analysis. `None` when no score can
/// be found; callers default to 0.
pub trait ScoreExtractor: Send + Sync {
    fn extract(&self, analysis: &str) -> Option<u32>;
}

/// Default extractor: first integer percentage after the literal
/// `OVERALL MATCH SCORE:` marker, case-insensitive.
pub struct MarkerScoreExtractor;

impl ScoreExtractor for MarkerScoreExtractor {
    fn extract(&self, analysis: &str) -> Option<u32> {
        let re = regex::Regex::new(r"(?i)OVERALL MATCH SCORE:\s*\[?\s*(\d{1,3})\s*%").ok()?;
        re.captures(analysis)?
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
    }
}
