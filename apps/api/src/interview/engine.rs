//! Interview engine — drives the session state machine.
//!
//! Lifecycle: NotStarted (no session) → InProgress (session present) →
//! Completed (session evicted). The length of `qa_history` is the sole
//! driver of the terminal transition: the interview completes exactly when
//! the caller reports the threshold number of answered pairs.

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::evaluation::{self, EvaluationResult};
use crate::interview::prompts::{
    FALLBACK_QUESTIONS, FIRST_QUESTION_PROMPT_TEMPLATE, INTERVIEWER_SYSTEM,
    NEXT_QUESTION_PROMPT_TEMPLATE,
};
use crate::interview::session::{InterviewSession, SessionStore};
use crate::interview::{QaPair, Violation};
use crate::llm_client::prompts::SINGLE_QUESTION_INSTRUCTION;
use crate::llm_client::Generate;
use crate::store::RecordStore;

/// Completed question/answer pairs per interview. Fixed policy, not
/// configurable per job.
pub const QUESTION_THRESHOLD: usize = 5;

#[derive(Debug)]
pub struct StartOutcome {
    pub question: String,
}

#[derive(Debug)]
pub enum ContinueOutcome {
    NextQuestion {
        next_question: String,
        qa_history: Vec<QaPair>,
        violations: Vec<Violation>,
    },
    Finished {
        message: String,
        qa_history: Vec<QaPair>,
        violations: Vec<Violation>,
        evaluation: EvaluationResult,
    },
}

pub struct InterviewEngine {
    llm: Arc<dyn Generate>,
    records: Arc<dyn RecordStore>,
    sessions: SessionStore,
}

impl InterviewEngine {
    pub fn new(llm: Arc<dyn Generate>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            llm,
            records,
            sessions: SessionStore::new(),
        }
    }

    /// Starts (or re-enters) an interview for `email`. A stored CV summary is
    /// required; its absence is a hard error. Re-entry into an in-progress
    /// session returns the latest question without touching history.
    pub async fn start_interview(
        &self,
        email: &str,
        job_description: &str,
    ) -> Result<StartOutcome, AppError> {
        if email.trim().is_empty() {
            return Err(AppError::MissingInput("Missing email".to_string()));
        }

        let record = self
            .records
            .find_by_email(email)
            .await
            .ok_or_else(|| AppError::NotFound(format!("no summary found for email: {email}")))?;

        let (handle, created) = self.sessions.get_or_create(email, || {
            InterviewSession::new(record.summary.clone(), job_description.to_string())
        });
        let mut session = handle.lock().await;

        if !created {
            if let Some(last) = session.qa_history.last() {
                info!("re-entered in-progress interview for {email}");
                return Ok(StartOutcome {
                    question: last.question.clone(),
                });
            }
        }

        let question = self.first_question(&session).await;
        session.qa_history.push(QaPair {
            question: question.clone(),
            answer: String::new(),
        });
        info!("started interview for {email}");

        Ok(StartOutcome { question })
    }

    /// Advances an in-progress interview. The caller's `qa_history` is
    /// adopted as authoritative (contract carried over from the original
    /// service: the client submits the full updated transcript, not a
    /// single new answer). Newly observed violations are appended, never
    /// replacing earlier ones.
    pub async fn continue_interview(
        &self,
        email: &str,
        qa_history: Vec<QaPair>,
        new_violations: Vec<Violation>,
    ) -> Result<ContinueOutcome, AppError> {
        if email.trim().is_empty() {
            return Err(AppError::MissingInput("Missing email".to_string()));
        }

        let handle = self.sessions.get(email).ok_or_else(|| {
            AppError::NotFound(format!("no active interview session for email: {email}"))
        })?;
        let mut session = handle.lock().await;

        session.qa_history = qa_history;
        session.violations.extend(new_violations);

        if session.qa_history.len() >= QUESTION_THRESHOLD {
            let evaluation =
                evaluation::evaluate(self.llm.as_ref(), &session.qa_history, &session.violations)
                    .await;
            let qa_history = std::mem::take(&mut session.qa_history);
            let violations = std::mem::take(&mut session.violations);
            drop(session);
            self.sessions.remove(email);
            info!(
                "interview completed for {email}: total_score={}",
                evaluation.total_score
            );

            return Ok(ContinueOutcome::Finished {
                message: "Interview complete. Thank you for your responses!".to_string(),
                qa_history,
                violations,
                evaluation,
            });
        }

        let next_question = self.next_question(&session).await;
        Ok(ContinueOutcome::NextQuestion {
            next_question,
            qa_history: session.qa_history.clone(),
            violations: session.violations.clone(),
        })
    }

    async fn first_question(&self, session: &InterviewSession) -> String {
        let prompt = FIRST_QUESTION_PROMPT_TEMPLATE
            .replace("{cv_summary}", &session.cv_summary)
            .replace("{job_description}", &session.job_description)
            .replace("{single_question_instruction}", SINGLE_QUESTION_INSTRUCTION);

        match self.llm.complete(&prompt, INTERVIEWER_SYSTEM).await {
            Ok(question) => question,
            Err(e) => {
                warn!("first-question generation failed, using fallback: {e}");
                FALLBACK_QUESTIONS[0].to_string()
            }
        }
    }

    async fn next_question(&self, session: &InterviewSession) -> String {
        let prompt = NEXT_QUESTION_PROMPT_TEMPLATE
            .replace("{cv_summary}", &session.cv_summary)
            .replace("{job_description}", &session.job_description)
            .replace(
                "{transcript}",
                &evaluation::render_transcript(&session.qa_history),
            )
            .replace("{single_question_instruction}", SINGLE_QUESTION_INSTRUCTION);

        match self.llm.complete(&prompt, INTERVIEWER_SYSTEM).await {
            Ok(question) => question,
            Err(e) => {
                warn!("next-question generation failed, using fallback: {e}");
                FALLBACK_QUESTIONS[session.qa_history.len() % FALLBACK_QUESTIONS.len()].to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::llm_client::LlmError;
    use crate::store::memory::InMemoryRecordStore;
    use crate::store::{CvSummaryRecord, Fingerprint};

    /// Stub backend: replies with a fixed string, or errors when `reply` is
    /// None.
    struct StubGenerate {
        reply: Option<String>,
    }

    #[async_trait]
    impl Generate for StubGenerate {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.reply.clone().ok_or(LlmError::EmptyContent)
        }
    }

    async fn engine_with_summary(reply: Option<&str>) -> InterviewEngine {
        let records = Arc::new(InMemoryRecordStore::new());
        records
            .append(CvSummaryRecord::new(
                Fingerprint::of_bytes(b"cv"),
                "Five years of backend work in Rust and Postgres.".to_string(),
                "a@x.com",
                "http://example.com/cv.pdf".to_string(),
            ))
            .await
            .unwrap();
        InterviewEngine::new(
            Arc::new(StubGenerate {
                reply: reply.map(str::to_string),
            }),
            records,
        )
    }

    fn answered(n: usize) -> Vec<QaPair> {
        (1..=n)
            .map(|i| QaPair {
                question: format!("Q{i}?"),
                answer: format!("A{i}."),
            })
            .collect()
    }

    fn violation(name: &str) -> Violation {
        Violation {
            name: name.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_start_requires_stored_summary() {
        let engine = engine_with_summary(Some("What draws you to this role?")).await;
        let err = engine.start_interview("nobody@x.com", "").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains("nobody@x.com"));
    }

    #[tokio::test]
    async fn test_start_returns_question_and_seeds_history() {
        let engine = engine_with_summary(Some("What draws you to this role?")).await;
        let outcome = engine.start_interview("a@x.com", "").await.unwrap();
        assert_eq!(outcome.question, "What draws you to this role?");
        assert!(engine.sessions.contains("a@x.com"));

        // Re-entry must not clear history: the same question comes back.
        let again = engine.start_interview("a@x.com", "").await.unwrap();
        assert_eq!(again.question, "What draws you to this role?");
    }

    #[tokio::test]
    async fn test_start_degrades_to_fallback_question() {
        let engine = engine_with_summary(None).await;
        let outcome = engine.start_interview("a@x.com", "").await.unwrap();
        assert_eq!(outcome.question, FALLBACK_QUESTIONS[0]);
    }

    #[tokio::test]
    async fn test_continue_without_session_is_not_found() {
        let engine = engine_with_summary(Some("Q")).await;
        let err = engine
            .continue_interview("a@x.com", answered(1), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_continue_under_threshold_returns_next_question() {
        let engine = engine_with_summary(Some("Deeper question?")).await;
        engine.start_interview("a@x.com", "").await.unwrap();

        let outcome = engine
            .continue_interview("a@x.com", answered(2), vec![])
            .await
            .unwrap();
        match outcome {
            ContinueOutcome::NextQuestion {
                next_question,
                qa_history,
                ..
            } => {
                assert_eq!(next_question, "Deeper question?");
                assert_eq!(qa_history.len(), 2);
            }
            ContinueOutcome::Finished { .. } => panic!("must not finish below threshold"),
        }
        assert!(engine.sessions.contains("a@x.com"));
    }

    #[tokio::test]
    async fn test_violations_accumulate_across_calls() {
        let engine = engine_with_summary(Some("Next?")).await;
        engine.start_interview("a@x.com", "").await.unwrap();

        engine
            .continue_interview("a@x.com", answered(1), vec![violation("tab_switch")])
            .await
            .unwrap();
        let outcome = engine
            .continue_interview("a@x.com", answered(2), vec![violation("paste_burst")])
            .await
            .unwrap();

        match outcome {
            ContinueOutcome::NextQuestion { violations, .. } => {
                assert_eq!(violations.len(), 2);
                assert_eq!(violations[0].name, "tab_switch");
                assert_eq!(violations[1].name, "paste_burst");
            }
            ContinueOutcome::Finished { .. } => panic!("must not finish below threshold"),
        }
    }

    #[tokio::test]
    async fn test_threshold_completes_and_evicts_exactly_at_five() {
        let engine = engine_with_summary(Some("not json at all")).await;
        engine.start_interview("a@x.com", "").await.unwrap();

        let outcome = engine
            .continue_interview("a@x.com", answered(4), vec![])
            .await
            .unwrap();
        assert!(matches!(outcome, ContinueOutcome::NextQuestion { .. }));

        let outcome = engine
            .continue_interview("a@x.com", answered(5), vec![])
            .await
            .unwrap();
        match outcome {
            ContinueOutcome::Finished {
                evaluation,
                qa_history,
                ..
            } => {
                assert_eq!(qa_history.len(), 5);
                // Evaluator replied with garbage — deterministic fallback.
                assert_eq!(evaluation.total_score, 0);
                assert_eq!(evaluation.questions.len(), 5);
            }
            ContinueOutcome::NextQuestion { .. } => panic!("must finish at threshold"),
        }

        // The session is gone; continuing again requires a fresh start.
        assert!(!engine.sessions.contains("a@x.com"));
        let err = engine
            .continue_interview("a@x.com", answered(5), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let fresh = engine.start_interview("a@x.com", "").await.unwrap();
        assert!(!fresh.question.is_empty());
    }

    #[tokio::test]
    async fn test_finished_evaluation_echoes_violations() {
        let engine = engine_with_summary(Some("not json at all")).await;
        engine.start_interview("a@x.com", "").await.unwrap();

        let outcome = engine
            .continue_interview("a@x.com", answered(5), vec![violation("tab_switch")])
            .await
            .unwrap();
        match outcome {
            ContinueOutcome::Finished {
                evaluation,
                violations,
                ..
            } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(evaluation.violations.len(), 1);
            }
            ContinueOutcome::NextQuestion { .. } => panic!("must finish at threshold"),
        }
    }
}
