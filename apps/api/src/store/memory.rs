//! In-memory record store.
//!
//! Thread-safe behind an `RwLock` with short critical sections. State is
//! process-local; the production deployment swaps in a store backed by the
//! external document index through the same trait.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{CvSummaryRecord, Fingerprint, RecordStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<CvSummaryRecord>>,
}

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Storage("lock poisoned".to_string())
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_by_fingerprint(&self, fp: &Fingerprint) -> Option<CvSummaryRecord> {
        self.records
            .read()
            .ok()?
            .iter()
            .find(|r| &r.fingerprint == fp)
            .cloned()
    }

    async fn find_by_email(&self, email: &str) -> Option<CvSummaryRecord> {
        let email = email.to_lowercase();
        self.records
            .read()
            .ok()?
            .iter()
            .find(|r| r.email == email)
            .cloned()
    }

    async fn append(&self, record: CvSummaryRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(poison_err)?;
        if records.iter().any(|r| r.fingerprint == record.fingerprint) {
            return Err(StoreError::Duplicate(record.fingerprint));
        }
        records.push(record);
        Ok(())
    }

    async fn all_summaries(&self) -> Vec<CvSummaryRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(bytes: &[u8], email: &str) -> CvSummaryRecord {
        CvSummaryRecord::new(
            Fingerprint::of_bytes(bytes),
            format!("summary of {email}"),
            email,
            "http://example.com/cv.pdf".to_string(),
        )
    }

    #[tokio::test]
    async fn test_append_then_find_by_fingerprint() {
        let store = InMemoryRecordStore::new();
        store.append(record(b"cv-a", "a@x.com")).await.unwrap();

        let found = store
            .find_by_fingerprint(&Fingerprint::of_bytes(b"cv-a"))
            .await
            .unwrap();
        assert_eq!(found.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_duplicate_fingerprint_is_rejected() {
        let store = InMemoryRecordStore::new();
        store.append(record(b"cv-a", "a@x.com")).await.unwrap();

        let result = store.append(record(b"cv-a", "b@y.com")).await;
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
        assert_eq!(store.all_summaries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_email_is_case_insensitive() {
        let store = InMemoryRecordStore::new();
        store.append(record(b"cv-a", "A@X.com")).await.unwrap();

        assert!(store.find_by_email("a@x.COM").await.is_some());
        assert!(store.find_by_email("other@x.com").await.is_none());
    }

    #[tokio::test]
    async fn test_lookup_is_exact_not_prefix() {
        let store = InMemoryRecordStore::new();
        store.append(record(b"cv-a", "a@x.com")).await.unwrap();

        let near_miss = Fingerprint::of_bytes(b"cv-a ");
        assert!(store.find_by_fingerprint(&near_miss).await.is_none());
    }
}
