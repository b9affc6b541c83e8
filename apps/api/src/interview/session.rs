//! Keyed interview session store.
//!
//! Sessions live only while an interview is in progress: creation marks the
//! InProgress state, removal marks Completed. Each session sits behind its
//! own `tokio::sync::Mutex`, so mutations for one candidate are serialized
//! even when the surrounding web layer runs handlers concurrently. The outer
//! map lock is only ever held for map operations, never across awaits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{QaPair, Violation};

/// Per-candidate interview state, keyed by lowercased email.
#[derive(Debug, Clone)]
pub struct InterviewSession {
    pub cv_summary: String,
    pub job_description: String,
    pub qa_history: Vec<QaPair>,
    pub violations: Vec<Violation>,
}

impl InterviewSession {
    pub fn new(cv_summary: String, job_description: String) -> Self {
        Self {
            cv_summary,
            job_description,
            qa_history: Vec::new(),
            violations: Vec::new(),
        }
    }
}

pub type SessionHandle = Arc<tokio::sync::Mutex<InterviewSession>>;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

fn key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `email`, creating it from `init` if absent.
    /// The second element is true when a new session was created.
    pub fn get_or_create(
        &self,
        email: &str,
        init: impl FnOnce() -> InterviewSession,
    ) -> (SessionHandle, bool) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        match sessions.get(&key(email)) {
            Some(handle) => (Arc::clone(handle), false),
            None => {
                let handle = Arc::new(tokio::sync::Mutex::new(init()));
                sessions.insert(key(email), Arc::clone(&handle));
                (handle, true)
            }
        }
    }

    pub fn get(&self, email: &str) -> Option<SessionHandle> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key(email))
            .cloned()
    }

    /// Evicts the session — the terminal transition to Completed. A later
    /// `get_or_create` for the same email starts a fresh interview.
    pub fn remove(&self, email: &str) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key(email));
    }

    pub fn contains(&self, email: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> InterviewSession {
        InterviewSession::new("summary".to_string(), "job".to_string())
    }

    #[test]
    fn test_get_or_create_is_idempotent_per_key() {
        let store = SessionStore::new();
        let (_, created_first) = store.get_or_create("a@x.com", session);
        let (_, created_again) = store.get_or_create("a@x.com", session);
        assert!(created_first);
        assert!(!created_again);
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let store = SessionStore::new();
        store.get_or_create("A@X.com", session);
        assert!(store.contains("a@x.com"));
        assert!(store.get("a@x.COM").is_some());
    }

    #[tokio::test]
    async fn test_handles_alias_the_same_session() {
        let store = SessionStore::new();
        let (first, _) = store.get_or_create("a@x.com", session);
        first.lock().await.qa_history.push(QaPair {
            question: "Q1".to_string(),
            answer: String::new(),
        });

        let second = store.get("a@x.com").unwrap();
        assert_eq!(second.lock().await.qa_history.len(), 1);
    }

    #[test]
    fn test_remove_frees_the_slot() {
        let store = SessionStore::new();
        store.get_or_create("a@x.com", session);
        store.remove("a@x.com");
        assert!(!store.contains("a@x.com"));

        let (_, created) = store.get_or_create("a@x.com", session);
        assert!(created, "a fresh session must be creatable after removal");
    }
}
