//! # Performance Monitor
//!
//! Ingests one metric per routed task, periodically folds the trailing window
//! into a [`SystemHealthSnapshot`], evaluates alert rules against it and feeds
//! observed latency and reliability back into the executor registry.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use super::alerts::{default_rules, Alert, AlertManager, AlertRule};
use super::metrics::{MetricsBuffer, PerformanceMetric};
use super::resources::{ResourceSampler, SystemResourceSampler};
use super::snapshot::{build_snapshot, SystemHealthSnapshot};
use crate::config::MonitorConfig;
use crate::events::{StatePublisher, Subscription};
use crate::health::HealthManager;
use crate::registry::ExecutorRegistry;

pub struct PerformanceMonitor {
    config: MonitorConfig,
    metrics: MetricsBuffer,
    snapshots: Mutex<VecDeque<SystemHealthSnapshot>>,
    alerts: Mutex<AlertManager>,
    health: Arc<HealthManager>,
    registry: Arc<ExecutorRegistry>,
    sampler: Arc<dyn ResourceSampler>,
    latest_snapshot: StatePublisher<Option<SystemHealthSnapshot>>,
    active_alerts: StatePublisher<Vec<Alert>>,
    /// Shutdown token of the current loop, `None` while stopped
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    generation: AtomicU64,
}

impl std::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("buffered_metrics", &self.metrics.len())
            .field("snapshots", &self.snapshots.lock().len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl PerformanceMonitor {
    pub fn new(
        config: MonitorConfig,
        health: Arc<HealthManager>,
        registry: Arc<ExecutorRegistry>,
    ) -> Self {
        let alerts = AlertManager::new(
            default_rules(&config.alerts),
            config.alert_capacity,
            config.alert_cooldown(),
        );
        Self {
            metrics: MetricsBuffer::new(config.metrics_capacity),
            snapshots: Mutex::new(VecDeque::with_capacity(config.snapshot_capacity)),
            alerts: Mutex::new(alerts),
            health,
            registry,
            sampler: Arc::new(SystemResourceSampler::new()),
            latest_snapshot: StatePublisher::new("system_health_snapshot", None),
            active_alerts: StatePublisher::new("unacknowledged_alerts", Vec::new()),
            shutdown: Mutex::new(None),
            generation: AtomicU64::new(0),
            config,
        }
    }

    pub fn with_resource_sampler(mut self, sampler: Arc<dyn ResourceSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    /// Append one outcome. Safe under concurrent writers.
    pub fn record_metrics(&self, metric: PerformanceMetric) {
        debug!(
            executor = %metric.executor,
            task_type = %metric.task_type,
            response_time_ms = metric.response_time_ms,
            success = metric.success,
            "Metric recorded"
        );
        self.metrics.push(metric);
    }

    pub fn take_snapshot(&self) -> SystemHealthSnapshot {
        self.take_snapshot_at(Utc::now())
    }

    /// Build, store and publish a snapshot of the window ending at `now`,
    /// then evaluate alert rules against it
    pub fn take_snapshot_at(&self, now: DateTime<Utc>) -> SystemHealthSnapshot {
        let window = self.metrics.window(now, self.config.window());
        let mut resource_usage = self.sampler.sample();
        resource_usage.buffered_metrics = self.metrics.len();

        let snapshot = build_snapshot(
            now,
            &window,
            self.health.active_fallbacks(),
            resource_usage,
            &self.config.health,
        );

        {
            let mut snapshots = self.snapshots.lock();
            if snapshots.len() >= self.config.snapshot_capacity.max(1) {
                snapshots.pop_front();
            }
            snapshots.push_back(snapshot.clone());
        }

        self.apply_feedback(&snapshot);
        self.latest_snapshot.publish(Some(snapshot.clone()));

        let unacknowledged = {
            let mut alerts = self.alerts.lock();
            let raised = alerts.evaluate(&snapshot);
            (!raised.is_empty()).then(|| alerts.unacknowledged())
        };
        if let Some(unacknowledged) = unacknowledged {
            self.active_alerts.publish(unacknowledged);
        }

        debug!(
            overall_health = snapshot.overall_health.as_str(),
            success_rate = snapshot.success_rate,
            avg_response_time_ms = snapshot.avg_response_time_ms,
            requests = snapshot.request_count,
            "Health snapshot taken"
        );

        snapshot
    }

    fn apply_feedback(&self, snapshot: &SystemHealthSnapshot) {
        for performance in snapshot.executor_breakdown.values() {
            self.registry.apply_feedback(
                &performance.executor,
                performance.avg_response_time_ms,
                performance.success_rate,
                self.config.feedback_smoothing,
            );
        }
    }

    /// Returns whether the alert exists
    pub fn acknowledge_alert(&self, alert_id: Uuid) -> bool {
        let unacknowledged = {
            let mut alerts = self.alerts.lock();
            alerts
                .acknowledge(alert_id)
                .then(|| alerts.unacknowledged())
        };
        match unacknowledged {
            Some(unacknowledged) => {
                info!(alert_id = %alert_id, "Alert acknowledged");
                self.active_alerts.publish(unacknowledged);
                true
            }
            None => false,
        }
    }

    pub fn add_alert_rule(&self, rule: AlertRule) {
        self.alerts.lock().add_rule(rule);
    }

    pub fn set_alert_rule_enabled(&self, rule_id: &str, enabled: bool) -> bool {
        self.alerts.lock().set_rule_enabled(rule_id, enabled)
    }

    /// Most recent `limit` metrics, oldest first
    pub fn recent_metrics(&self, limit: usize) -> Vec<PerformanceMetric> {
        self.metrics.recent(limit)
    }

    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    pub fn snapshot_history(&self) -> Vec<SystemHealthSnapshot> {
        self.snapshots.lock().iter().cloned().collect()
    }

    pub fn latest_snapshot(&self) -> Option<SystemHealthSnapshot> {
        self.latest_snapshot.current()
    }

    pub fn alert_history(&self) -> Vec<Alert> {
        self.alerts.lock().history()
    }

    pub fn unacknowledged_alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unacknowledged()
    }

    pub fn subscribe_snapshots(&self) -> Subscription<Option<SystemHealthSnapshot>> {
        self.latest_snapshot.subscribe()
    }

    pub fn subscribe_alerts(&self) -> Subscription<Vec<Alert>> {
        self.active_alerts.subscribe()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.lock().is_some()
    }

    /// Spawn the snapshot loop. The first snapshot is taken one interval after start.
    pub fn start(self: &Arc<Self>) {
        let mut slot = self.shutdown.lock();
        if slot.is_some() {
            debug!("Performance monitor already running");
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        *slot = Some(shutdown_tx);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        drop(slot);

        let monitor = Arc::clone(self);
        let period = self.config.snapshot_interval();
        info!(
            snapshot_interval_seconds = self.config.snapshot_interval_seconds,
            window_seconds = self.config.window_seconds,
            generation,
            "Starting performance monitor loop"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        info!(generation, "Performance monitor loop shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        monitor.take_snapshot();
                    }
                }
            }
            monitor.finish_run(generation);
        });
    }

    pub fn stop(&self) {
        if let Some(shutdown_tx) = self.shutdown.lock().take() {
            let _ = shutdown_tx.send(true);
        }
    }

    fn finish_run(&self, generation: u64) {
        let mut slot = self.shutdown.lock();
        if self.generation.load(Ordering::SeqCst) == generation {
            *slot = None;
        }
    }
}
