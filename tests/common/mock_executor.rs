//! Scripted executors whose behavior tests can change between calls

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::registry::{ExecutorRequest, TaskExecutor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    /// Never returns; only a deadline ends the call
    Hang,
}

#[derive(Debug)]
pub struct ScriptedExecutor {
    name: String,
    latency: Duration,
    behavior: Mutex<Behavior>,
    calls: AtomicUsize,
    probes: AtomicUsize,
    last_request: Mutex<Option<ExecutorRequest>>,
}

impl ScriptedExecutor {
    pub fn new(name: &str, latency_ms: u64, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            latency: Duration::from_millis(latency_ms),
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn succeeding(name: &str, latency_ms: u64) -> Arc<Self> {
        Self::new(name, latency_ms, Behavior::Succeed)
    }

    pub fn failing(name: &str, latency_ms: u64) -> Arc<Self> {
        Self::new(name, latency_ms, Behavior::Fail)
    }

    pub fn hanging(name: &str, latency_ms: u64) -> Arc<Self> {
        Self::new(name, latency_ms, Behavior::Hang)
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-probe executions
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ExecutorRequest> {
        self.last_request.lock().clone()
    }

    async fn run(&self) -> anyhow::Result<()> {
        let behavior = *self.behavior.lock();
        match behavior {
            Behavior::Succeed => {
                tokio::time::sleep(self.latency).await;
                Ok(())
            }
            Behavior::Fail => {
                tokio::time::sleep(self.latency).await;
                anyhow::bail!("{} returned 503 Service Unavailable", self.name)
            }
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    async fn execute(&self, request: &ExecutorRequest) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());
        self.run().await?;
        Ok(format!("{} handled: {}", self.name, request.original))
    }

    async fn probe(&self) -> anyhow::Result<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.run().await
    }
}
