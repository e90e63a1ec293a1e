//! # Health Probes
//!
//! Lightweight checks that exercise each monitored service's real call path.

use async_trait::async_trait;
use std::sync::Arc;

use super::connectivity::ConnectivityMonitor;
use crate::constants::services;
use crate::registry::ExecutorRegistry;

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Name of the health record this probe feeds
    fn service_name(&self) -> &str;

    async fn check(&self) -> anyhow::Result<()>;
}

/// Resolves an executor through the registry and runs its readiness probe.
/// A factory that fails to initialize counts as a failed probe.
pub struct ExecutorProbe {
    name: String,
    registry: Arc<ExecutorRegistry>,
}

impl ExecutorProbe {
    pub fn new(name: impl Into<String>, registry: Arc<ExecutorRegistry>) -> Self {
        Self {
            name: name.into(),
            registry,
        }
    }
}

#[async_trait]
impl HealthProbe for ExecutorProbe {
    fn service_name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> anyhow::Result<()> {
        let executor = self.registry.resolve(&self.name).await?;
        executor.probe().await
    }
}

/// Feeds the `network` record from the connectivity monitor
pub struct NetworkProbe {
    connectivity: ConnectivityMonitor,
}

impl NetworkProbe {
    pub fn new(connectivity: ConnectivityMonitor) -> Self {
        Self { connectivity }
    }
}

#[async_trait]
impl HealthProbe for NetworkProbe {
    fn service_name(&self) -> &str {
        services::NETWORK
    }

    async fn check(&self) -> anyhow::Result<()> {
        if self.connectivity.is_online() {
            Ok(())
        } else {
            anyhow::bail!("network is offline")
        }
    }
}
