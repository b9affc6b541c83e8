pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview_handlers;
use crate::pipeline::handlers as pipeline_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Batch pipeline + uniform capability entry point
        .route(
            "/trigger_pipeline",
            post(pipeline_handlers::handle_trigger_pipeline),
        )
        .route("/dispatch", post(pipeline_handlers::handle_dispatch))
        .route(
            "/generate_emails",
            post(pipeline_handlers::handle_generate_emails),
        )
        // Interview lifecycle
        .route(
            "/start_interview",
            post(interview_handlers::handle_start_interview),
        )
        .route(
            "/next_question",
            post(interview_handlers::handle_next_question),
        )
        .with_state(state)
}
