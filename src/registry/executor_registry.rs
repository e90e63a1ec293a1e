//! # Executor Registry
//!
//! Thread-safe registry of backend executors keyed by name.
//!
//! ## Key Features
//!
//! - **Lazy construction**: a factory runs the first time an executor is resolved
//! - **Memoized handles**: concurrent first resolves of one name share a single
//!   construction through a per-entry initialization cell
//! - **Retry after failure**: a failed factory leaves the entry uninitialized, so
//!   the next resolve tries again. Whether a service is dead is the health
//!   manager's call, not the registry's.
//! - **Performance feedback**: the monitor nudges each descriptor's observed
//!   latency and reliability toward measured values

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::executor_factory::{ExecutorFactory, TaskExecutor};
use crate::config::ExecutorConfig;
use crate::constants::TaskType;
use crate::error::{RelayError, Result};

/// Static description of an executor plus its feedback-adjusted figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorDescriptor {
    pub name: String,
    /// Task types this executor serves well, in order
    pub capabilities: Vec<TaskType>,
    /// Latency declared in configuration; call deadlines derive from it
    pub configured_latency_ms: u64,
    /// Observed average latency, seeded from configuration
    pub avg_latency_ms: f64,
    pub unit_cost: f64,
    /// Observed reliability in [0, 1], seeded from configuration
    pub reliability: f64,
    pub offline_capable: bool,
}

impl ExecutorDescriptor {
    pub fn new(name: impl Into<String>, capabilities: Vec<TaskType>, avg_latency_ms: u64) -> Self {
        Self {
            name: name.into(),
            capabilities,
            configured_latency_ms: avg_latency_ms,
            avg_latency_ms: avg_latency_ms as f64,
            unit_cost: 0.0,
            reliability: 1.0,
            offline_capable: false,
        }
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability.clamp(0.0, 1.0);
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: f64) -> Self {
        self.unit_cost = unit_cost;
        self
    }

    pub fn offline_capable(mut self, offline_capable: bool) -> Self {
        self.offline_capable = offline_capable;
        self
    }

    pub fn from_config(config: &ExecutorConfig) -> Result<Self> {
        Ok(Self {
            name: config.name.clone(),
            capabilities: config.parsed_capabilities()?,
            configured_latency_ms: config.avg_latency_ms,
            avg_latency_ms: config.avg_latency_ms as f64,
            unit_cost: config.unit_cost,
            reliability: config.reliability,
            offline_capable: config.offline_capable,
        })
    }

    pub fn supports(&self, task_type: TaskType) -> bool {
        self.capabilities.contains(&task_type)
    }
}

struct ExecutorEntry {
    order: usize,
    descriptor: RwLock<ExecutorDescriptor>,
    factory: Arc<dyn ExecutorFactory>,
    handle: OnceCell<Arc<dyn TaskExecutor>>,
}

/// Registry of executors; descriptors are never removed at runtime
#[derive(Default)]
pub struct ExecutorRegistry {
    entries: DashMap<String, Arc<ExecutorEntry>>,
    next_order: AtomicUsize,
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("executors", &self.names())
            .finish()
    }
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor with the factory that builds its live handle
    pub fn register(
        &self,
        descriptor: ExecutorDescriptor,
        factory: Arc<dyn ExecutorFactory>,
    ) -> Result<()> {
        let name = descriptor.name.clone();
        match self.entries.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RelayError::Configuration(format!(
                "executor '{name}' is already registered"
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                info!(
                    executor = %name,
                    capabilities = ?descriptor.capabilities,
                    avg_latency_ms = descriptor.configured_latency_ms,
                    offline_capable = descriptor.offline_capable,
                    "Executor registered"
                );
                slot.insert(Arc::new(ExecutorEntry {
                    order: self.next_order.fetch_add(1, Ordering::Relaxed),
                    descriptor: RwLock::new(descriptor),
                    factory,
                    handle: OnceCell::new(),
                }));
                Ok(())
            }
        }
    }

    /// Obtain the live handle, constructing it on first use
    pub async fn resolve(&self, name: &str) -> Result<Arc<dyn TaskExecutor>> {
        // Clone the entry out so no map guard is held across the await
        let entry = self.entry(name)?;

        entry
            .handle
            .get_or_try_init(|| async {
                debug!(executor = %name, "Initializing executor");
                entry.factory.create(name).await.map_err(|e| {
                    warn!(executor = %name, error = %e, "Executor initialization failed");
                    RelayError::InitializationFailed {
                        executor: name.to_string(),
                        reason: e.to_string(),
                    }
                })
            })
            .await
            .cloned()
    }

    /// Current descriptor, including feedback-adjusted latency and reliability
    pub fn describe(&self, name: &str) -> Result<ExecutorDescriptor> {
        Ok(self.entry(name)?.descriptor.read().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .map(|entry| entry.handle.initialized())
            .unwrap_or(false)
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<String> {
        let mut named: Vec<(usize, String)> = self
            .entries
            .iter()
            .map(|entry| (entry.order, entry.key().clone()))
            .collect();
        named.sort_unstable_by_key(|(order, _)| *order);
        named.into_iter().map(|(_, name)| name).collect()
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<ExecutorDescriptor> {
        let mut entries: Vec<Arc<ExecutorEntry>> =
            self.entries.iter().map(|entry| entry.value().clone()).collect();
        entries.sort_unstable_by_key(|entry| entry.order);
        entries
            .iter()
            .map(|entry| entry.descriptor.read().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move observed latency and reliability toward measured values
    pub(crate) fn apply_feedback(
        &self,
        name: &str,
        observed_latency_ms: f64,
        observed_success_rate: f64,
        smoothing: f64,
    ) {
        let Some(entry) = self.entries.get(name).map(|entry| entry.value().clone()) else {
            return;
        };
        let mut descriptor = entry.descriptor.write();
        descriptor.avg_latency_ms += smoothing * (observed_latency_ms - descriptor.avg_latency_ms);
        descriptor.reliability = (descriptor.reliability
            + smoothing * (observed_success_rate - descriptor.reliability))
            .clamp(0.0, 1.0);
    }

    fn entry(&self, name: &str) -> Result<Arc<ExecutorEntry>> {
        self.entries
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RelayError::NotFound(format!("executor '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::executor_factory::{ExecutorRequest, FnFactory};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct Fixed(&'static str);

    #[async_trait]
    impl TaskExecutor for Fixed {
        async fn execute(&self, _request: &ExecutorRequest) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct SlowCountingFactory {
        builds: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ExecutorFactory for SlowCountingFactory {
        async fn create(&self, _name: &str) -> anyhow::Result<Arc<dyn TaskExecutor>> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Arc::new(Fixed("slow")))
        }
    }

    fn fixed_factory(response: &'static str) -> Arc<dyn ExecutorFactory> {
        FnFactory::shared(move |_| Ok(Arc::new(Fixed(response)) as Arc<dyn TaskExecutor>))
    }

    #[tokio::test]
    async fn test_register_describe_resolve() {
        let registry = ExecutorRegistry::new();
        registry
            .register(
                ExecutorDescriptor::new("fast", vec![TaskType::FastResponse], 200),
                fixed_factory("quick"),
            )
            .unwrap();

        let descriptor = registry.describe("fast").unwrap();
        assert_eq!(descriptor.configured_latency_ms, 200);
        assert!(descriptor.supports(TaskType::FastResponse));
        assert!(!registry.is_initialized("fast"));

        let executor = registry.resolve("fast").await.unwrap();
        let response = executor
            .execute(&ExecutorRequest::new(TaskType::FastResponse, "hi"))
            .await
            .unwrap();
        assert_eq!(response, "quick");
        assert!(registry.is_initialized("fast"));
    }

    #[tokio::test]
    async fn test_unknown_name_is_not_found() {
        let registry = ExecutorRegistry::new();
        assert!(matches!(
            registry.resolve("ghost").await,
            Err(RelayError::NotFound(_))
        ));
        assert!(matches!(
            registry.describe("ghost"),
            Err(RelayError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = ExecutorRegistry::new();
        let descriptor = ExecutorDescriptor::new("fast", vec![], 100);
        registry
            .register(descriptor.clone(), fixed_factory("a"))
            .unwrap();
        assert!(registry.register(descriptor, fixed_factory("b")).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_construct_once() {
        let registry = Arc::new(ExecutorRegistry::new());
        let builds = Arc::new(AtomicUsize::new(0));
        registry
            .register(
                ExecutorDescriptor::new("slow", vec![TaskType::GeneralQuery], 1000),
                Arc::new(SlowCountingFactory {
                    builds: builds.clone(),
                }),
            )
            .unwrap();

        let resolves: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.resolve("slow").await.is_ok() })
            })
            .collect();
        for handle in resolves {
            assert!(handle.await.unwrap());
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_initialization_is_retried() {
        let registry = ExecutorRegistry::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        registry
            .register(
                ExecutorDescriptor::new("flaky", vec![], 100),
                FnFactory::shared(move |_| {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        anyhow::bail!("model weights not downloaded")
                    }
                    Ok(Arc::new(Fixed("ready")) as Arc<dyn TaskExecutor>)
                }),
            )
            .unwrap();

        let first = registry.resolve("flaky").await;
        assert!(matches!(
            first,
            Err(RelayError::InitializationFailed { .. })
        ));
        assert!(!registry.is_initialized("flaky"));

        assert!(registry.resolve("flaky").await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_names_keep_registration_order() {
        let registry = ExecutorRegistry::new();
        for name in ["general", "fast", "offline", "speech"] {
            registry
                .register(ExecutorDescriptor::new(name, vec![], 100), fixed_factory("x"))
                .unwrap();
        }
        assert_eq!(
            registry.names(),
            vec!["general", "fast", "offline", "speech"]
        );
    }

    #[test]
    fn test_feedback_moves_toward_observation() {
        let registry = ExecutorRegistry::new();
        registry
            .register(
                ExecutorDescriptor::new("general", vec![], 1000).with_reliability(1.0),
                fixed_factory("x"),
            )
            .unwrap();

        registry.apply_feedback("general", 2000.0, 0.5, 0.5);
        let descriptor = registry.describe("general").unwrap();
        assert_eq!(descriptor.avg_latency_ms, 1500.0);
        assert_eq!(descriptor.reliability, 0.75);
        // The configured figure that call deadlines derive from is untouched
        assert_eq!(descriptor.configured_latency_ms, 1000);

        // Unknown names are ignored
        registry.apply_feedback("ghost", 1.0, 1.0, 0.5);
    }
}
