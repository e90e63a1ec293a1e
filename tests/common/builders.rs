//! Builders wiring registry, health manager, monitor and router around scripted executors

#![allow(dead_code)]

use relay_core::config::{HealthConfig, MonitorConfig, RouterConfig};
use relay_core::constants::TaskType;
use relay_core::health::{ConnectivityMonitor, HealthManager};
use relay_core::monitor::{FixedResourceSampler, PerformanceMonitor};
use relay_core::orchestration::Router;
use relay_core::registry::{ExecutorDescriptor, ExecutorRegistry, FnFactory, TaskExecutor};
use std::sync::Arc;

use super::mock_executor::ScriptedExecutor;

pub fn descriptor(name: &str, capabilities: &[TaskType], latency_ms: u64) -> ExecutorDescriptor {
    ExecutorDescriptor::new(name, capabilities.to_vec(), latency_ms)
}

/// Components of one isolated core
pub struct Harness {
    pub registry: Arc<ExecutorRegistry>,
    pub connectivity: ConnectivityMonitor,
    pub health: Arc<HealthManager>,
    pub monitor: Arc<PerformanceMonitor>,
    pub router: Router,
}

pub struct HarnessBuilder {
    executors: Vec<(ExecutorDescriptor, Arc<ScriptedExecutor>)>,
    router: RouterConfig,
    health: HealthConfig,
    monitor: MonitorConfig,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            executors: Vec::new(),
            router: RouterConfig::default(),
            health: HealthConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }

    pub fn executor(mut self, descriptor: ExecutorDescriptor, executor: &Arc<ScriptedExecutor>) -> Self {
        self.executors.push((descriptor, executor.clone()));
        self
    }

    /// Route only by declared capabilities
    pub fn without_strategy_table(mut self) -> Self {
        self.router.strategies.clear();
        self
    }

    pub fn strategy(mut self, task_type: TaskType, names: &[&str]) -> Self {
        self.router.strategies.insert(
            task_type.as_str().to_string(),
            names.iter().map(|name| name.to_string()).collect(),
        );
        self
    }

    pub fn monitor_config(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn health_config(mut self, health: HealthConfig) -> Self {
        self.health = health;
        self
    }

    pub fn build(self) -> Harness {
        let registry = Arc::new(ExecutorRegistry::new());
        for (descriptor, executor) in self.executors {
            let handle: Arc<dyn TaskExecutor> = executor;
            registry
                .register(descriptor, FnFactory::shared(move |_| Ok(handle.clone())))
                .expect("unique executor names");
        }

        let connectivity = ConnectivityMonitor::default();
        let health = Arc::new(HealthManager::for_registry(
            self.health,
            registry.clone(),
            connectivity.clone(),
        ));
        let monitor = Arc::new(
            PerformanceMonitor::new(self.monitor, health.clone(), registry.clone())
                .with_resource_sampler(Arc::new(FixedResourceSampler::default())),
        );
        let router = Router::new(self.router, registry.clone(), health.clone(), monitor.clone())
            .expect("valid router configuration");

        Harness {
            registry,
            connectivity,
            health,
            monitor,
            router,
        }
    }
}
