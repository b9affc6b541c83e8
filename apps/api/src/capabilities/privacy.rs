//! Data privacy safeguard — rejects candidate records carrying restricted
//! fields before any further processing. Runs on the RAW candidate record,
//! not the generated summary.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::dispatch::Capability;
use crate::errors::AppError;

pub const TASK_SAFEGUARD_DATA_CHECK: &str = "safeguard_data_check";

/// Top-level field names that must never enter the pipeline.
const RESTRICTED_FIELDS: [&str; 3] = ["ssn", "credit_card", "password"];

pub struct PrivacySafeguardCapability;

fn check_candidate(candidate: &Map<String, Value>) -> Result<(), AppError> {
    if RESTRICTED_FIELDS
        .iter()
        .any(|field| candidate.contains_key(*field))
    {
        return Err(AppError::PolicyViolation(
            "PII detected — operation not allowed.".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl Capability for PrivacySafeguardCapability {
    fn name(&self) -> &str {
        "privacy_safeguard"
    }

    fn can_handle(&self, task: &str) -> bool {
        task == TASK_SAFEGUARD_DATA_CHECK
    }

    async fn perform(&self, _task: &str, payload: Value) -> Result<Value, AppError> {
        let candidate = payload
            .get("candidate_data")
            .and_then(Value::as_object)
            .ok_or_else(|| AppError::MissingInput("Missing 'candidate_data'".to_string()))?;

        // A violation is this capability's RESULT, not a handler failure —
        // it must reach callers as `{"error": ...}` verbatim, without the
        // router's failed-task wrapper.
        match check_candidate(candidate) {
            Ok(()) => Ok(json!({ "status": "ok" })),
            Err(violation) => Ok(json!({ "error": violation.to_string() })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_candidate_passes() {
        let result = PrivacySafeguardCapability
            .perform(
                TASK_SAFEGUARD_DATA_CHECK,
                json!({ "candidate_data": { "email": "a@x.com", "firstName": "Ada" } }),
            )
            .await
            .unwrap();
        assert_eq!(result["status"], "ok");
    }

    #[tokio::test]
    async fn test_restricted_field_yields_exact_error_shape() {
        let result = PrivacySafeguardCapability
            .perform(
                TASK_SAFEGUARD_DATA_CHECK,
                json!({ "candidate_data": { "email": "a@x.com", "password": "p" } }),
            )
            .await
            .unwrap();
        assert_eq!(result["error"], "PII detected — operation not allowed.");
    }

    #[tokio::test]
    async fn test_each_restricted_field_is_caught() {
        for field in RESTRICTED_FIELDS {
            let result = PrivacySafeguardCapability
                .perform(
                    TASK_SAFEGUARD_DATA_CHECK,
                    json!({ "candidate_data": { field: "x" } }),
                )
                .await
                .unwrap();
            assert!(result.get("error").is_some(), "{field} must be rejected");
        }
    }

    #[tokio::test]
    async fn test_nested_fields_are_not_inspected() {
        // The check is over top-level field names only.
        let result = PrivacySafeguardCapability
            .perform(
                TASK_SAFEGUARD_DATA_CHECK,
                json!({ "candidate_data": { "notes": { "password": "p" } } }),
            )
            .await
            .unwrap();
        assert_eq!(result["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_candidate_data_is_rejected() {
        let err = PrivacySafeguardCapability
            .perform(TASK_SAFEGUARD_DATA_CHECK, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingInput(_)));
    }
}
