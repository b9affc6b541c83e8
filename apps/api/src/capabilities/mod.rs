//! Concrete capability handlers registered with the task router.

pub mod email;
pub mod fetch;
pub mod interview;
pub mod job_match;
pub mod privacy;
pub mod prompts;
pub mod summarize;

use std::sync::Arc;

use crate::dispatch::TaskRegistry;
use crate::interview::engine::InterviewEngine;
use crate::llm_client::Generate;

/// Assembles the production registry. Order matters — routing is
/// first-match — so registration follows the original service's bootstrap
/// order: generation-backed capabilities first, then infrastructure, then
/// safeguards.
pub fn build_registry(
    llm: Arc<dyn Generate>,
    engine: Arc<InterviewEngine>,
    download_dir: &str,
) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry.register(Arc::new(summarize::CvSummaryCapability::new(Arc::clone(
        &llm,
    ))));
    registry.register(Arc::new(job_match::JobMatchCapability::new(Arc::clone(
        &llm,
    ))));
    registry.register(Arc::new(interview::InterviewCapability::new(engine)));
    registry.register(Arc::new(email::EmailGenerationCapability::new(llm)));
    registry.register(Arc::new(fetch::FileFetchCapability::new(download_dir)));
    registry.register(Arc::new(privacy::PrivacySafeguardCapability));
    registry
}
