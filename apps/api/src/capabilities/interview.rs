//! Interview capability — exposes the session lifecycle through the task
//! dispatch surface so callers can drive interviews with the same uniform
//! entry point as every other operation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::dispatch::Capability;
use crate::errors::AppError;
use crate::interview::engine::InterviewEngine;
use crate::interview::handlers::continue_outcome_value;
use crate::interview::{QaPair, Violation};

pub const TASK_START_INTERVIEW: &str = "start_interview";
pub const TASK_CONTINUE_INTERVIEW: &str = "continue_interview";

pub struct InterviewCapability {
    engine: Arc<InterviewEngine>,
}

#[derive(Debug, Deserialize)]
struct InterviewTaskRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    job_description: String,
    #[serde(default)]
    qa_history: Vec<QaPair>,
    #[serde(default)]
    violations: Vec<Violation>,
}

impl InterviewCapability {
    pub fn new(engine: Arc<InterviewEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Capability for InterviewCapability {
    fn name(&self) -> &str {
        "interview"
    }

    fn can_handle(&self, task: &str) -> bool {
        matches!(task, TASK_START_INTERVIEW | TASK_CONTINUE_INTERVIEW)
    }

    async fn perform(&self, task: &str, payload: Value) -> Result<Value, AppError> {
        let request: InterviewTaskRequest = serde_json::from_value(payload)
            .map_err(|e| AppError::MissingInput(format!("invalid interview payload: {e}")))?;

        match task {
            TASK_START_INTERVIEW => {
                let outcome = self
                    .engine
                    .start_interview(&request.email, &request.job_description)
                    .await?;
                Ok(json!({ "success": true, "question": outcome.question }))
            }
            TASK_CONTINUE_INTERVIEW => {
                let outcome = self
                    .engine
                    .continue_interview(&request.email, request.qa_history, request.violations)
                    .await?;
                Ok(continue_outcome_value(outcome))
            }
            other => Err(AppError::NotFound(format!("Unknown task type: {other}"))),
        }
    }
}
