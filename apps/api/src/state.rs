use std::sync::Arc;

use crate::capabilities::job_match::ScoreExtractor;
use crate::config::Config;
use crate::dispatch::TaskRegistry;
use crate::interview::engine::InterviewEngine;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum
/// extractors.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TaskRegistry>,
    pub records: Arc<dyn RecordStore>,
    pub engine: Arc<InterviewEngine>,
    /// Pluggable match-score extraction. Default: MarkerScoreExtractor.
    pub score_extractor: Arc<dyn ScoreExtractor>,
    pub config: Config,
}
