//! Batch pipeline orchestrator.
//!
//! Flow per candidate: resolve CV document → fingerprint →
//! cached-or-generated summary → privacy safeguard → job match →
//! notification draft. Every failure is local to its candidate; the batch
//! never aborts. Candidates are processed strictly sequentially — the only
//! suspension points are the collaborator calls behind the task router.

pub mod handlers;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::capabilities::email::TASK_GENERATE_EMAIL;
use crate::capabilities::fetch::TASK_DOWNLOAD_FILE;
use crate::capabilities::job_match::{ScoreExtractor, TASK_MATCH_CV};
use crate::capabilities::privacy::TASK_SAFEGUARD_DATA_CHECK;
use crate::capabilities::summarize::TASK_SUMMARIZE_CV;
use crate::dispatch::{error_message, TaskRegistry};
use crate::store::{CvSummaryRecord, Fingerprint, RecordStore};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobPost {
    #[serde(rename = "jobTitle")]
    pub job_title: String,
    #[serde(rename = "jobDescription")]
    pub job_description: String,
    #[serde(rename = "closingDate")]
    pub closing_date: String,
}

impl Default for JobPost {
    fn default() -> Self {
        Self {
            job_title: "Unknown Job".to_string(),
            job_description: String::new(),
            closing_date: String::new(),
        }
    }
}

/// Per-candidate outcome. Error entries keep the candidate visible in the
/// batch result instead of silently dropping them.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CandidateBatchResult {
    Error {
        candidate_name: String,
        error: String,
    },
    Success {
        candidate_name: String,
        email: String,
        score: u32,
        match_analysis: String,
        email_content: String,
    },
}

impl CandidateBatchResult {
    pub fn score(&self) -> u32 {
        match self {
            CandidateBatchResult::Success { score, .. } => *score,
            CandidateBatchResult::Error { .. } => 0,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CandidateBatchResult::Error { .. })
    }
}

/// Resolves a summary for a document's bytes: exact-match cache lookup on
/// the content fingerprint, generation on miss.
///
/// A rejected store write after successful generation is logged as a
/// detected duplicate and does NOT fail the caller — the generated summary
/// is returned either way. Across a batch, byte-identical documents invoke
/// the summarizer at most once.
pub async fn summarize_with_dedup(
    registry: &TaskRegistry,
    records: &dyn RecordStore,
    bytes: &[u8],
    cv_path: &str,
    email: &str,
    source: &str,
) -> Result<String, String> {
    let fingerprint = Fingerprint::of_bytes(bytes);

    if let Some(record) = records.find_by_fingerprint(&fingerprint).await {
        info!("using cached summary for fingerprint {fingerprint}");
        return Ok(record.summary);
    }

    let result = registry
        .dispatch(TASK_SUMMARIZE_CV, json!({ "cv_path": cv_path }))
        .await;
    if let Some(message) = error_message(&result) {
        return Err(message.to_string());
    }
    let summary = result
        .get("summary")
        .and_then(Value::as_str)
        .ok_or_else(|| "summarizer returned no summary".to_string())?
        .to_string();

    let record = CvSummaryRecord::new(fingerprint, summary.clone(), email, source.to_string());
    if let Err(e) = records.append(record).await {
        warn!("duplicate detected when storing summary for {email}: {e}");
    }

    Ok(summary)
}

/// Runs the full hiring pipeline over a candidate list, in list order, and
/// returns one result per candidate sorted by match score descending
/// (stable — ties keep insertion order).
///
/// Candidates stay as raw JSON records because the privacy safeguard
/// inspects the record's own top-level field names, not a projection.
pub async fn orchestrate_batch(
    registry: &TaskRegistry,
    records: &dyn RecordStore,
    score_extractor: &dyn ScoreExtractor,
    job_post: &JobPost,
    candidates: &[Value],
) -> Vec<CandidateBatchResult> {
    let mut results = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let candidate_name = full_name(candidate);
        let email = text_field(candidate, "email").unwrap_or("unknown@example.com");

        let Some(cv_url) = text_field(candidate, "cvURL").filter(|url| !url.is_empty()) else {
            results.push(CandidateBatchResult::Error {
                candidate_name,
                error: "No CV URL".to_string(),
            });
            continue;
        };

        info!("processing CV for {candidate_name} from {cv_url}");

        let filename = cv_url.rsplit('/').next().unwrap_or("document.pdf");
        let download = registry
            .dispatch(
                TASK_DOWNLOAD_FILE,
                json!({ "url": cv_url, "filename": filename }),
            )
            .await;
        if let Some(message) = error_message(&download) {
            results.push(CandidateBatchResult::Error {
                candidate_name,
                error: message.to_string(),
            });
            continue;
        }

        let file_path = download.get("file_path").and_then(Value::as_str);
        let bytes = match file_path {
            Some(path) => tokio::fs::read(path).await.ok(),
            None => None,
        };
        let Some(bytes) = bytes else {
            results.push(CandidateBatchResult::Error {
                candidate_name,
                error: "Downloaded file missing".to_string(),
            });
            continue;
        };

        let summary = match summarize_with_dedup(
            registry,
            records,
            &bytes,
            file_path.unwrap_or_default(),
            email,
            cv_url,
        )
        .await
        {
            Ok(summary) => summary,
            Err(error) => {
                results.push(CandidateBatchResult::Error {
                    candidate_name,
                    error,
                });
                continue;
            }
        };

        let safeguard = registry
            .dispatch(
                TASK_SAFEGUARD_DATA_CHECK,
                json!({ "candidate_data": candidate }),
            )
            .await;
        if let Some(message) = error_message(&safeguard) {
            results.push(CandidateBatchResult::Error {
                candidate_name,
                error: message.to_string(),
            });
            continue;
        }

        info!(
            "matching CV to job '{}' for {candidate_name}",
            job_post.job_title
        );
        let match_result = registry
            .dispatch(
                TASK_MATCH_CV,
                json!({
                    "cv_summary": summary,
                    "job_summary": job_post.job_description,
                }),
            )
            .await;
        // Match failure is not fatal for the candidate: the error text
        // becomes the analysis and the score defaults to 0.
        let (match_analysis, score) = match error_message(&match_result) {
            Some(message) => (message.to_string(), 0),
            None => {
                let analysis = match_result
                    .get("analysis")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let score = score_extractor.extract(&analysis).unwrap_or(0);
                (analysis, score)
            }
        };

        let email_result = registry
            .dispatch(
                TASK_GENERATE_EMAIL,
                json!({
                    "cv_summary": summary,
                    "job_description": job_post.job_description,
                    "candidate_email": email,
                    "candidate_name": candidate_name,
                    "job_title": job_post.job_title,
                    "closing_date": job_post.closing_date,
                }),
            )
            .await;
        let email_content = match error_message(&email_result) {
            Some(message) => message.to_string(),
            None => email_result
                .get("email")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };

        results.push(CandidateBatchResult::Success {
            candidate_name,
            email: email.to_string(),
            score,
            match_analysis,
            email_content,
        });
    }

    results.sort_by(|a, b| b.score().cmp(&a.score()));
    results
}

fn text_field<'a>(candidate: &'a Value, key: &str) -> Option<&'a str> {
    candidate.get(key).and_then(Value::as_str)
}

fn full_name(candidate: &Value) -> String {
    format!(
        "{} {}",
        text_field(candidate, "firstName").unwrap_or_default(),
        text_field(candidate, "lastName").unwrap_or_default()
    )
    .trim()
    .to_string()
}
