//! # Executor Factory
//!
//! The seam between the registry and concrete backend services. A factory is
//! invoked lazily the first time an executor is resolved; the registry caches
//! the handle it returns.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::constants::TaskType;

/// Payload handed to an executor after request shaping
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorRequest {
    pub task_type: TaskType,
    /// Payload after request shaping
    pub payload: String,
    /// Payload as the caller sent it
    pub original: String,
    pub context: Map<String, Value>,
}

impl ExecutorRequest {
    pub fn new(task_type: TaskType, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        Self {
            task_type,
            original: payload.clone(),
            payload,
            context: Map::new(),
        }
    }

    pub fn with_shaped_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Minimal request used by readiness probes
    pub fn probe() -> Self {
        let mut request = Self::new(TaskType::GeneralQuery, "ping");
        request
            .context
            .insert("probe".to_string(), Value::Bool(true));
        request
    }

    pub fn is_probe(&self) -> bool {
        matches!(self.context.get("probe"), Some(Value::Bool(true)))
    }
}

/// A live handle to one backend service
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, request: &ExecutorRequest) -> anyhow::Result<String>;

    /// Lightweight readiness check exercising the real call path
    async fn probe(&self) -> anyhow::Result<()> {
        self.execute(&ExecutorRequest::probe()).await.map(|_| ())
    }
}

impl fmt::Debug for dyn TaskExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TaskExecutor")
    }
}

/// Builds a live executor on first use
#[async_trait]
pub trait ExecutorFactory: Send + Sync {
    async fn create(&self, name: &str) -> anyhow::Result<Arc<dyn TaskExecutor>>;
}

/// Adapter turning a synchronous closure into an [`ExecutorFactory`]
pub struct FnFactory<F> {
    build: F,
}

impl<F> FnFactory<F>
where
    F: Fn(&str) -> anyhow::Result<Arc<dyn TaskExecutor>> + Send + Sync + 'static,
{
    pub fn new(build: F) -> Self {
        Self { build }
    }

    pub fn shared(build: F) -> Arc<dyn ExecutorFactory> {
        Arc::new(Self::new(build))
    }
}

#[async_trait]
impl<F> ExecutorFactory for FnFactory<F>
where
    F: Fn(&str) -> anyhow::Result<Arc<dyn TaskExecutor>> + Send + Sync + 'static,
{
    async fn create(&self, name: &str) -> anyhow::Result<Arc<dyn TaskExecutor>> {
        (self.build)(name)
    }
}
