//! CV summary record store — the narrow interface over the document index.
//!
//! Records are keyed by a content fingerprint (SHA-256 over raw file bytes)
//! and are append-only: a record is written once per distinct fingerprint and
//! never updated in place. Lookup is exact-match, never similarity-based.

pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Content hash of a document's raw bytes, used as the exact-match cache key.
///
/// Identical bytes always yield the identical fingerprint regardless of the
/// source filename or URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored CV summary: fingerprint, generated text, candidate email tag,
/// and the source locator the document was fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvSummaryRecord {
    pub id: Uuid,
    pub fingerprint: Fingerprint,
    pub summary: String,
    /// Lowercased at construction; lookups are case-insensitive.
    pub email: String,
    pub source: String,
}

impl CvSummaryRecord {
    pub fn new(fingerprint: Fingerprint, summary: String, email: &str, source: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            fingerprint,
            summary,
            email: email.to_lowercase(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record with fingerprint {0} already exists")]
    Duplicate(Fingerprint),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Exact-match record store contract. The backing index may be a similarity
/// store, but this interface never exposes approximate lookup.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_fingerprint(&self, fp: &Fingerprint) -> Option<CvSummaryRecord>;

    /// Case-insensitive exact match on the stored email tag.
    async fn find_by_email(&self, email: &str) -> Option<CvSummaryRecord>;

    /// Appends a new record. Rejects the write if a record with the same
    /// fingerprint already exists.
    async fn append(&self, record: CvSummaryRecord) -> Result<(), StoreError>;

    async fn all_summaries(&self) -> Vec<CvSummaryRecord>;
}
