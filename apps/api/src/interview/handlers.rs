//! Axum route handlers for the interview lifecycle.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::interview::engine::ContinueOutcome;
use crate::interview::{QaPair, Violation};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct NextQuestionRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub qa_history: Vec<QaPair>,
    #[serde(default)]
    pub violations: Vec<Violation>,
}

/// Maps a continue outcome onto the wire shape shared by the HTTP surface
/// and the dispatch surface.
pub fn continue_outcome_value(outcome: ContinueOutcome) -> Value {
    match outcome {
        ContinueOutcome::NextQuestion {
            next_question,
            qa_history,
            violations,
        } => json!({
            "success": true,
            "finished": false,
            "next_question": next_question,
            "qa_history": qa_history,
            "violations": violations,
        }),
        ContinueOutcome::Finished {
            message,
            qa_history,
            violations,
            evaluation,
        } => json!({
            "success": true,
            "finished": true,
            "message": message,
            "qa_history": qa_history,
            "violations": violations,
            "evaluation": evaluation,
        }),
    }
}

/// POST /start_interview
///
/// Requires a stored CV summary for the email; starts (or re-enters) the
/// session and returns the first question.
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Json(request): Json<StartInterviewRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = state
        .engine
        .start_interview(&request.email, &request.job_description)
        .await?;
    Ok(Json(json!({ "success": true, "question": outcome.question })))
}

/// POST /next_question
///
/// Advances the interview with the caller's full updated history. At the
/// question threshold the session completes and the evaluation is returned.
pub async fn handle_next_question(
    State(state): State<AppState>,
    Json(request): Json<NextQuestionRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = state
        .engine
        .continue_interview(&request.email, request.qa_history, request.violations)
        .await?;
    Ok(Json(continue_outcome_value(outcome)))
}
