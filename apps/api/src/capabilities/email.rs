//! Notification email capability — drafts the recruitment email text.
//! Delivery is out of scope; this produces the message body only.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::capabilities::prompts::EMAIL_PROMPT_TEMPLATE;
use crate::dispatch::Capability;
use crate::errors::AppError;
use crate::llm_client::prompts::RECRUITMENT_SYSTEM;
use crate::llm_client::Generate;

pub const TASK_GENERATE_EMAIL: &str = "generate_email";

pub struct EmailGenerationCapability {
    llm: Arc<dyn Generate>,
}

#[derive(Debug, Deserialize)]
struct EmailRequest {
    candidate_name: String,
    candidate_email: String,
    job_title: String,
    #[serde(default)]
    job_description: String,
    #[serde(default)]
    closing_date: String,
    #[serde(default)]
    interview_date: String,
}

impl EmailGenerationCapability {
    pub fn new(llm: Arc<dyn Generate>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Capability for EmailGenerationCapability {
    fn name(&self) -> &str {
        "email_generation"
    }

    fn can_handle(&self, task: &str) -> bool {
        task == TASK_GENERATE_EMAIL
    }

    async fn perform(&self, _task: &str, payload: Value) -> Result<Value, AppError> {
        let request: EmailRequest = serde_json::from_value(payload).map_err(|_| {
            AppError::MissingInput(
                "Missing candidate_name, candidate_email, or job_title".to_string(),
            )
        })?;

        let prompt = EMAIL_PROMPT_TEMPLATE
            .replace("{job_title}", &request.job_title)
            .replace("{job_description}", &request.job_description)
            .replace("{interview_date}", &request.interview_date)
            .replace("{closing_date}", &request.closing_date)
            .replace("{candidate_name}", &request.candidate_name)
            .replace("{candidate_email}", &request.candidate_email);

        let email = self
            .llm
            .complete(&prompt, RECRUITMENT_SYSTEM)
            .await
            .map_err(|e| AppError::Upstream(format!("email generation failed: {e}")))?;

        Ok(json!({ "email": email }))
    }
}
