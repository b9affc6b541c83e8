//! CV summarization capability — document bytes to a professional summary.
//!
//! The expensive call in the whole pipeline; callers are expected to go
//! through the content-addressed cache (`pipeline::summarize_with_dedup`)
//! rather than dispatching this task per candidate.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::capabilities::prompts::CV_SUMMARY_PROMPT_TEMPLATE;
use crate::dispatch::Capability;
use crate::errors::AppError;
use crate::extract;
use crate::llm_client::prompts::RECRUITMENT_SYSTEM;
use crate::llm_client::Generate;

pub const TASK_SUMMARIZE_CV: &str = "summarize_cv";

/// Cap on CV text forwarded to the generation backend.
const CV_TEXT_LIMIT: usize = 4000;

pub struct CvSummaryCapability {
    llm: Arc<dyn Generate>,
}

#[derive(Debug, Deserialize)]
struct SummarizeRequest {
    cv_path: String,
}

impl CvSummaryCapability {
    pub fn new(llm: Arc<dyn Generate>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Capability for CvSummaryCapability {
    fn name(&self) -> &str {
        "cv_summary"
    }

    fn can_handle(&self, task: &str) -> bool {
        task == TASK_SUMMARIZE_CV
    }

    async fn perform(&self, _task: &str, payload: Value) -> Result<Value, AppError> {
        let request: SummarizeRequest = serde_json::from_value(payload)
            .map_err(|_| AppError::MissingInput("'cv_path' is required".to_string()))?;

        let bytes = tokio::fs::read(&request.cv_path)
            .await
            .map_err(|e| AppError::Upstream(format!("could not read {}: {e}", request.cv_path)))?;

        let cv_text = extract::text_from_pdf_bytes(&bytes).ok_or_else(|| {
            AppError::MalformedResponse("could not extract text from CV".to_string())
        })?;
        let cv_text: String = cv_text.chars().take(CV_TEXT_LIMIT).collect();

        let prompt = CV_SUMMARY_PROMPT_TEMPLATE.replace("{cv_text}", &cv_text);
        let summary = self
            .llm
            .complete(&prompt, RECRUITMENT_SYSTEM)
            .await
            .map_err(|e| AppError::Upstream(format!("CV summarization failed: {e}")))?;

        Ok(json!({ "summary": summary }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;

    struct StubGenerate;

    #[async_trait]
    impl Generate for StubGenerate {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Ok("summary text".to_string())
        }
    }

    #[tokio::test]
    async fn test_missing_cv_path_is_rejected() {
        let capability = CvSummaryCapability::new(Arc::new(StubGenerate));
        let err = capability
            .perform(TASK_SUMMARIZE_CV, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_unreadable_path_is_upstream_failure() {
        let capability = CvSummaryCapability::new(Arc::new(StubGenerate));
        let err = capability
            .perform(
                TASK_SUMMARIZE_CV,
                json!({ "cv_path": "/nonexistent/cv.pdf" }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_unextractable_document_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.pdf");
        tokio::fs::write(&path, b"not a pdf").await.unwrap();

        let capability = CvSummaryCapability::new(Arc::new(StubGenerate));
        let err = capability
            .perform(TASK_SUMMARIZE_CV, json!({ "cv_path": path }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }
}
