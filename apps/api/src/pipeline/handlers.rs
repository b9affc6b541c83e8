//! Axum route handlers for the batch pipeline and the uniform dispatch
//! surface.

use axum::{extract::State, Json};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::capabilities::email::TASK_GENERATE_EMAIL;
use crate::dispatch::error_message;
use crate::errors::AppError;
use crate::pipeline::{orchestrate_batch, JobPost};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TriggerPipelineRequest {
    pub data: Option<PipelineData>,
}

#[derive(Debug, Deserialize)]
pub struct PipelineData {
    #[serde(rename = "jobPost", default)]
    pub job_post: JobPost,
    #[serde(rename = "candidateList", default)]
    pub candidate_list: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub task: String,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateEmailsRequest {
    #[serde(rename = "jobId", default)]
    pub job_id: Option<Value>,
    #[serde(rename = "jobTitle")]
    pub job_title: String,
    #[serde(rename = "jobDescription")]
    pub job_description: String,
    #[serde(rename = "closingDate")]
    pub closing_date: String,
    pub candidates: Vec<EmailCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct EmailCandidate {
    #[serde(default = "default_candidate_name")]
    pub name: String,
    #[serde(default = "default_candidate_email")]
    pub email: String,
}

fn default_candidate_name() -> String {
    "Candidate".to_string()
}

fn default_candidate_email() -> String {
    "unknown@example.com".to_string()
}

/// POST /trigger_pipeline
///
/// Runs the full batch pipeline over the submitted job post and candidate
/// list. Per-candidate failures land in the result list; the call itself
/// only fails on missing input.
pub async fn handle_trigger_pipeline(
    State(state): State<AppState>,
    Json(request): Json<TriggerPipelineRequest>,
) -> Result<Json<Value>, AppError> {
    let data = request
        .data
        .ok_or_else(|| AppError::MissingInput("Missing application data".to_string()))?;

    let results = orchestrate_batch(
        &state.registry,
        state.records.as_ref(),
        state.score_extractor.as_ref(),
        &data.job_post,
        &data.candidate_list,
    )
    .await;

    let failed = results.iter().filter(|r| r.is_error()).count();
    info!(
        "pipeline finished: {} candidates, {} failed",
        results.len(),
        failed
    );

    Ok(Json(json!({ "success": true, "results": results })))
}

/// POST /dispatch
///
/// Uniform entry point for every capability: `{"task": ..., "payload": ...}`.
/// The response is the capability's result map, or `{"error": ...}`.
pub async fn handle_dispatch(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> Json<Value> {
    let payload = request.payload.unwrap_or_else(|| json!({}));
    Json(state.registry.dispatch(&request.task, payload).await)
}

/// POST /generate_emails
///
/// Drafts interview-invitation emails for a candidate list. The interview
/// date defaults to one week after the closing date.
pub async fn handle_generate_emails(
    State(state): State<AppState>,
    Json(request): Json<GenerateEmailsRequest>,
) -> Result<Json<Value>, AppError> {
    let closing_date = parse_closing_date(&request.closing_date)
        .ok_or_else(|| AppError::MissingInput("Invalid closingDate format".to_string()))?;
    let interview_date = (closing_date + Duration::days(7))
        .format("%Y-%m-%d")
        .to_string();
    let closing_date = closing_date.format("%Y-%m-%d").to_string();

    let mut emails = Vec::with_capacity(request.candidates.len());
    for candidate in &request.candidates {
        let result = state
            .registry
            .dispatch(
                TASK_GENERATE_EMAIL,
                json!({
                    "job_description": request.job_description,
                    "interview_date": interview_date,
                    "candidate_name": candidate.name,
                    "candidate_email": candidate.email,
                    "job_title": request.job_title,
                    "closing_date": closing_date,
                }),
            )
            .await;

        // A failed draft is recorded per candidate, like the batch pipeline.
        match error_message(&result) {
            Some(error) => emails.push(json!({
                "candidate_name": candidate.name,
                "email": candidate.email,
                "error": error,
            })),
            None => emails.push(json!({
                "candidate_name": candidate.name,
                "email": candidate.email,
                "generated_email": result.get("email").and_then(Value::as_str).unwrap_or_default(),
            })),
        }
    }

    Ok(Json(json!({
        "success": true,
        "job_id": request.job_id,
        "job_title": request.job_title,
        "interview_date": interview_date,
        "closing_date": closing_date,
        "emails": emails,
    })))
}

/// Accepts `2026-09-01T00:00:00Z`, `2026-09-01T00:00:00`, or `2026-09-01`.
fn parse_closing_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim().trim_end_matches('Z');
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_closing_date_accepts_iso_datetime() {
        assert_eq!(
            parse_closing_date("2026-09-01T12:30:00Z"),
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
    }

    #[test]
    fn test_parse_closing_date_accepts_plain_date() {
        assert_eq!(
            parse_closing_date("2026-09-01"),
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
    }

    #[test]
    fn test_parse_closing_date_rejects_garbage() {
        assert_eq!(parse_closing_date("next friday"), None);
    }

    #[test]
    fn test_interview_date_is_one_week_after_closing() {
        let closing = parse_closing_date("2026-09-01").unwrap();
        let interview = closing + Duration::days(7);
        assert_eq!(interview.format("%Y-%m-%d").to_string(), "2026-09-08");
    }
}
