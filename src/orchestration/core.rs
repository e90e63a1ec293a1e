//! # Relay Core
//!
//! Bootstrap path shared by every embedder: builds the executor registry from
//! configuration, then the health manager, performance monitor and router on
//! top of it. Instances are independent; nothing is process-global.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::router::Router;
use super::types::{OrchestrationContext, OrchestrationOutcome};
use crate::config::{ConfigManager, RelayConfig};
use crate::constants::{services, Priority, TaskType};
use crate::error::{RelayError, Result};
use crate::executors::OfflineFactory;
use crate::health::{ConnectivityMonitor, HealthManager};
use crate::monitor::PerformanceMonitor;
use crate::registry::{ExecutorDescriptor, ExecutorFactory, ExecutorRegistry};

/// Factories keyed by executor `kind`
pub type FactoryMap = HashMap<String, Arc<dyn ExecutorFactory>>;

pub struct RelayCore {
    id: Uuid,
    config: RelayConfig,
    registry: Arc<ExecutorRegistry>,
    connectivity: ConnectivityMonitor,
    health: Arc<HealthManager>,
    monitor: Arc<PerformanceMonitor>,
    router: Arc<Router>,
}

impl std::fmt::Debug for RelayCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayCore")
            .field("id", &self.id)
            .field("executors", &self.registry.names())
            .finish()
    }
}

impl RelayCore {
    /// Load configuration for the detected environment, falling back to defaults
    pub fn load(config_dir: Option<PathBuf>, factories: FactoryMap) -> Result<Self> {
        let manager = ConfigManager::load_or_default(config_dir)?;
        info!(
            environment = %manager.environment(),
            config_directory = %manager.config_directory().display(),
            "Configuration loaded"
        );
        Self::from_config(manager.config().clone(), factories)
    }

    /// Build every component from `config`. Executors of kind `offline` use the
    /// built-in factory unless `factories` overrides it.
    pub fn from_config(config: RelayConfig, factories: FactoryMap) -> Result<Self> {
        config.validate()?;
        let id = Uuid::new_v4();

        let registry = Arc::new(ExecutorRegistry::new());
        for executor in &config.executors {
            let factory = match factories.get(&executor.kind) {
                Some(factory) => factory.clone(),
                None if executor.kind == services::OFFLINE_KIND => {
                    Arc::new(OfflineFactory) as Arc<dyn ExecutorFactory>
                }
                None => {
                    return Err(RelayError::Configuration(format!(
                        "no factory supplied for executor '{}' of kind '{}'",
                        executor.name, executor.kind
                    )))
                }
            };
            registry.register(ExecutorDescriptor::from_config(executor)?, factory)?;
        }

        let connectivity = ConnectivityMonitor::default();
        let health = Arc::new(HealthManager::for_registry(
            config.health.clone(),
            registry.clone(),
            connectivity.clone(),
        ));
        let monitor = Arc::new(PerformanceMonitor::new(
            config.monitor.clone(),
            health.clone(),
            registry.clone(),
        ));
        let router = Arc::new(Router::new(
            config.router.clone(),
            registry.clone(),
            health.clone(),
            monitor.clone(),
        )?);

        info!(
            core_id = %id,
            executors = ?registry.names(),
            "Relay core initialized"
        );

        Ok(Self {
            id,
            config,
            registry,
            connectivity,
            health,
            monitor,
            router,
        })
    }

    /// Start the health probe loop and the snapshot loop
    pub fn start(&self) {
        info!(core_id = %self.id, "Starting relay core background loops");
        self.health.start();
        self.monitor.start();
    }

    pub fn stop(&self) {
        info!(core_id = %self.id, "Stopping relay core background loops");
        self.health.stop();
        self.monitor.stop();
    }

    pub async fn orchestrate(
        &self,
        request: &str,
        task_type: TaskType,
        priority: Priority,
        context: Option<OrchestrationContext>,
    ) -> Result<OrchestrationOutcome> {
        self.router
            .orchestrate(request, task_type, priority, context)
            .await
    }

    /// Operator override, see [`HealthManager::force_emergency_mode`]
    pub async fn force_emergency_mode(&self, enabled: bool) {
        self.health.force_emergency_mode(enabled).await;
    }

    pub fn acknowledge_alert(&self, alert_id: Uuid) -> bool {
        self.monitor.acknowledge_alert(alert_id)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ExecutorRegistry> {
        &self.registry
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn health(&self) -> &Arc<HealthManager> {
        &self.health
    }

    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutorConfig;

    #[tokio::test]
    async fn test_default_config_routes_to_offline() {
        let core = RelayCore::from_config(RelayConfig::default(), FactoryMap::new()).unwrap();
        assert_eq!(core.registry().names(), vec!["offline"]);

        let outcome = core
            .orchestrate("Am I allowed to film?", TaskType::LegalAnalysis, Priority::Medium, None)
            .await
            .unwrap();
        assert_eq!(outcome.executor_used, "offline");
        assert!(outcome.response.contains("Am I allowed to film?"));
    }

    #[test]
    fn test_missing_factory_is_a_configuration_error() {
        let mut config = RelayConfig::default();
        config.executors.push(ExecutorConfig {
            name: "general".to_string(),
            kind: "http".to_string(),
            capabilities: vec!["general_query".to_string()],
            avg_latency_ms: 1500,
            unit_cost: 0.002,
            reliability: 0.9,
            offline_capable: false,
        });

        let err = RelayCore::from_config(config, FactoryMap::new()).unwrap_err();
        assert!(matches!(err, RelayError::Configuration(_)));
    }

    #[test]
    fn test_instances_are_isolated() {
        let a = RelayCore::from_config(RelayConfig::default(), FactoryMap::new()).unwrap();
        let b = RelayCore::from_config(RelayConfig::default(), FactoryMap::new()).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(!Arc::ptr_eq(a.health(), b.health()));
    }
}
