//! # Orchestration Types
//!
//! Values produced per `orchestrate` call. None of them are persisted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::constants::{Priority, TaskType};

/// Which executor runs a request and what backs it up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub task_type: TaskType,
    pub selected: String,
    /// Remaining eligible executors in preference order. Only the first is ever tried.
    pub fallbacks: Vec<String>,
    pub reasoning: String,
    pub estimated_latency_ms: f64,
    pub priority: Priority,
}

impl RoutingDecision {
    pub fn first_fallback(&self) -> Option<&str> {
        self.fallbacks.first().map(String::as_str)
    }
}

/// Caller-supplied key/values forwarded to the executor untouched
pub type OrchestrationContext = Map<String, Value>;

/// Successful result of `orchestrate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationOutcome {
    pub response: String,
    pub executor_used: String,
    /// Wall time from dispatch to terminal outcome, including a failed primary attempt
    pub response_time: Duration,
    pub decision: RoutingDecision,
}

impl OrchestrationOutcome {
    pub fn used_fallback(&self) -> bool {
        self.executor_used != self.decision.selected
    }
}
