//! Capability registry / task router.
//!
//! Capabilities are registered once at startup; `dispatch` routes a task id
//! plus JSON payload to the FIRST registered capability that claims it.
//! Registration order therefore matters when task-id sets could overlap.
//! Every handler failure is folded into a uniform `{"error": ...}` value —
//! callers never observe a raw error type through this surface.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::AppError;

/// A named unit of orchestration logic that claims and performs one or more
/// task identifiers. Immutable once registered.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> &str;

    fn can_handle(&self, task: &str) -> bool;

    /// Performs `task` with the given payload. `task` is passed through so a
    /// capability claiming several task ids can branch on it.
    async fn perform(&self, task: &str, payload: Value) -> Result<Value, AppError>;
}

#[derive(Default)]
pub struct TaskRegistry {
    capabilities: Vec<Arc<dyn Capability>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        debug!("registered capability '{}'", capability.name());
        self.capabilities.push(capability);
    }

    /// Routes `task` to the first capability claiming it and invokes it
    /// exactly once. All failures come back as `{"error": "..."}`.
    pub async fn dispatch(&self, task: &str, payload: Value) -> Value {
        for capability in &self.capabilities {
            if capability.can_handle(task) {
                return match capability.perform(task, payload).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("task '{}' failed in '{}': {}", task, capability.name(), e);
                        json!({
                            "error": format!(
                                "task '{}' failed in '{}': {}",
                                task,
                                capability.name(),
                                e
                            )
                        })
                    }
                };
            }
        }
        json!({ "error": format!("no capability for task: {task}") })
    }
}

/// The error message of a dispatch result, if it is one.
pub fn error_message(result: &Value) -> Option<&str> {
    result.get("error").and_then(Value::as_str)
}
