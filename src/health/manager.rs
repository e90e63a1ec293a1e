//! # Health Manager
//!
//! Owns every [`ServiceHealthRecord`] and the process-wide [`DegradationLevel`].
//!
//! Probe rounds are serialized by an internal round lock, which makes the
//! probe loop the single writer of health state. Routing reads records and the
//! published level without coordinating with each other.
//!
//! Rounds are triggered by:
//! - the periodic probe interval
//! - a connectivity transition (network probe only, immediately)
//! - clearing a forced emergency mode
//! - an explicit [`HealthManager::run_probe_cycle`] call

use chrono::Utc;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::connectivity::ConnectivityMonitor;
use super::fallback::{recommend, ServiceRecommendation};
use super::probe::{ExecutorProbe, HealthProbe, NetworkProbe};
use super::record::{compute_global_level, ProbeOutcome, ServiceHealthRecord};
use crate::config::HealthConfig;
use crate::constants::{services, DegradationLevel, FallbackTier, Priority, TaskType};
use crate::events::{StatePublisher, Subscription};
use crate::logging::log_health_transition;
use crate::registry::ExecutorRegistry;

/// Health records keyed by service name
pub type HealthRecords = BTreeMap<String, ServiceHealthRecord>;

pub struct HealthManager {
    config: HealthConfig,
    probes: RwLock<Vec<Arc<dyn HealthProbe>>>,
    records: RwLock<HealthRecords>,
    connectivity: ConnectivityMonitor,
    /// Connectivity value last fed into the network record
    applied_connectivity: Mutex<Option<bool>>,
    forced_emergency: AtomicBool,
    round_lock: tokio::sync::Mutex<()>,
    level: StatePublisher<DegradationLevel>,
    emergency_mode: StatePublisher<bool>,
    fallbacks: StatePublisher<Vec<FallbackTier>>,
    published_records: StatePublisher<HealthRecords>,
    /// Shutdown token of the current loop, `None` while stopped
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    generation: AtomicU64,
}

impl std::fmt::Debug for HealthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthManager")
            .field("level", &self.level.current())
            .field("forced_emergency", &self.forced_emergency.load(Ordering::SeqCst))
            .field("services", &self.records.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HealthManager {
    /// Manager with no probes. Add them with [`HealthManager::add_probe`].
    pub fn new(config: HealthConfig, connectivity: ConnectivityMonitor) -> Self {
        Self {
            config,
            probes: RwLock::new(Vec::new()),
            records: RwLock::new(BTreeMap::new()),
            connectivity,
            applied_connectivity: Mutex::new(None),
            forced_emergency: AtomicBool::new(false),
            round_lock: tokio::sync::Mutex::new(()),
            level: StatePublisher::new("degradation_level", DegradationLevel::Normal),
            emergency_mode: StatePublisher::new("emergency_mode", false),
            fallbacks: StatePublisher::new("active_fallbacks", Vec::new()),
            published_records: StatePublisher::new("health_records", BTreeMap::new()),
            shutdown: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Manager probing every registered executor plus the network
    pub fn for_registry(
        config: HealthConfig,
        registry: Arc<ExecutorRegistry>,
        connectivity: ConnectivityMonitor,
    ) -> Self {
        let manager = Self::new(config, connectivity.clone());
        for name in registry.names() {
            manager.add_probe(Arc::new(ExecutorProbe::new(name, registry.clone())));
        }
        manager.add_probe(Arc::new(NetworkProbe::new(connectivity)));
        manager
    }

    /// Start monitoring a service. Its record starts healthy until probed.
    pub fn add_probe(&self, probe: Arc<dyn HealthProbe>) {
        let service = probe.service_name().to_string();
        debug!(service = %service, "Health probe added");
        self.probes.write().push(probe);

        let snapshot = {
            let mut records = self.records.write();
            records
                .entry(service.clone())
                .or_insert_with(|| ServiceHealthRecord::new(service));
            records.clone()
        };
        self.published_records.publish(snapshot);
    }

    /// Run one full probe round and return the effective level
    pub async fn run_probe_cycle(&self) -> DegradationLevel {
        let _round = self.round_lock.lock().await;

        *self.applied_connectivity.lock() = Some(self.connectivity.is_online());
        let probes = self.probes.read().clone();
        debug!(probes = probes.len(), "Running health probe round");
        self.probe_and_apply(&probes).await;

        self.degradation_level()
    }

    /// Report a connectivity transition and re-evaluate the network record now.
    /// Returns whether connectivity changed.
    pub async fn set_network_online(&self, online: bool) -> bool {
        let changed = self.connectivity.set_online(online);
        if changed {
            self.reevaluate_network().await;
        }
        changed
    }

    async fn reevaluate_network(&self) {
        let _round = self.round_lock.lock().await;

        let online = self.connectivity.is_online();
        {
            let mut applied = self.applied_connectivity.lock();
            if *applied == Some(online) {
                return;
            }
            *applied = Some(online);
        }

        let probes: Vec<Arc<dyn HealthProbe>> = self
            .probes
            .read()
            .iter()
            .filter(|probe| probe.service_name() == services::NETWORK)
            .cloned()
            .collect();
        if probes.is_empty() {
            return;
        }

        info!(online = online, "Re-evaluating network health outside the probe cycle");
        self.probe_and_apply(&probes).await;
    }

    async fn probe_and_apply(&self, probes: &[Arc<dyn HealthProbe>]) {
        let timeout = self.config.probe_timeout();

        let outcomes = join_all(probes.iter().map(|probe| async move {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(timeout, probe.check()).await {
                Ok(Ok(())) => ProbeOutcome::success(elapsed_ms(started)),
                Ok(Err(e)) => ProbeOutcome::failure(elapsed_ms(started), e.to_string()),
                Err(_) => ProbeOutcome::failure(
                    timeout.as_millis() as u64,
                    format!("probe timed out after {}ms", timeout.as_millis()),
                ),
            };
            (probe.service_name().to_string(), outcome)
        }))
        .await;

        let checked_at = Utc::now();
        {
            let mut records = self.records.write();
            for (service, outcome) in &outcomes {
                let record = records
                    .entry(service.clone())
                    .or_insert_with(|| ServiceHealthRecord::new(service.clone()));
                let was_healthy = record.is_healthy;
                record.apply_probe_at(outcome, &self.config, checked_at);

                if was_healthy && !record.is_healthy {
                    warn!(
                        service = %service,
                        error = ?record.last_error,
                        error_rate = record.error_rate,
                        "Service became unhealthy"
                    );
                } else if !was_healthy && record.is_healthy {
                    info!(service = %service, "Service recovered");
                }
                debug!(
                    service = %service,
                    healthy = record.is_healthy,
                    response_time_ms = record.response_time_ms,
                    error_rate = record.error_rate,
                    degradation = %record.degradation,
                    "Health record updated"
                );
            }
        }

        self.evaluate();
    }

    /// Recompute the global level from the records and publish the result
    fn evaluate(&self) {
        let records = self.records.read().clone();
        let computed = compute_global_level(records.values(), &self.config.thresholds);
        let unhealthy = unhealthy_services(&records);
        self.published_records.publish(records);

        if self.forced_emergency.load(Ordering::SeqCst) {
            debug!(computed = %computed, "Emergency mode is forced, computed level not applied");
            return;
        }
        self.apply_level(computed, &unhealthy, false);
    }

    fn apply_level(&self, level: DegradationLevel, unhealthy: &[String], forced: bool) {
        let previous = self.level.current();
        if self.level.publish_if_changed(level) {
            log_health_transition(previous, level, unhealthy, forced);
        }
        self.emergency_mode
            .publish_if_changed(level == DegradationLevel::EmergencyOnly);
        self.fallbacks.publish_if_changed(level.active_fallbacks());
    }

    /// Operator override. Enabling pins `emergency_only` until cleared; clearing
    /// re-derives state from a fresh probe round.
    pub async fn force_emergency_mode(&self, enabled: bool) {
        if enabled {
            let _round = self.round_lock.lock().await;
            self.forced_emergency.store(true, Ordering::SeqCst);
            warn!("Emergency mode forced by operator");
            let unhealthy = unhealthy_services(&self.records.read());
            self.apply_level(DegradationLevel::EmergencyOnly, &unhealthy, true);
        } else {
            if self.forced_emergency.swap(false, Ordering::SeqCst) {
                info!("Forced emergency mode cleared, re-evaluating health");
            }
            self.run_probe_cycle().await;
        }
    }

    pub fn get_best_available_service(
        &self,
        task_type: TaskType,
        priority: Priority,
    ) -> ServiceRecommendation {
        recommend(
            self.degradation_level(),
            self.is_network_healthy(),
            task_type,
            priority,
        )
    }

    pub fn degradation_level(&self) -> DegradationLevel {
        self.level.current()
    }

    pub fn is_emergency_mode(&self) -> bool {
        self.emergency_mode.current()
    }

    pub fn is_forced_emergency(&self) -> bool {
        self.forced_emergency.load(Ordering::SeqCst)
    }

    pub fn active_fallbacks(&self) -> Vec<FallbackTier> {
        self.fallbacks.current()
    }

    pub fn records(&self) -> HealthRecords {
        self.records.read().clone()
    }

    pub fn record(&self, service: &str) -> Option<ServiceHealthRecord> {
        self.records.read().get(service).cloned()
    }

    /// Unknown services count as healthy
    pub fn is_service_healthy(&self, service: &str) -> bool {
        self.records
            .read()
            .get(service)
            .map(|record| record.is_healthy)
            .unwrap_or(true)
    }

    pub fn is_network_healthy(&self) -> bool {
        self.is_service_healthy(services::NETWORK)
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    pub fn subscribe_degradation_level(&self) -> Subscription<DegradationLevel> {
        self.level.subscribe()
    }

    pub fn subscribe_emergency_mode(&self) -> Subscription<bool> {
        self.emergency_mode.subscribe()
    }

    pub fn subscribe_active_fallbacks(&self) -> Subscription<Vec<FallbackTier>> {
        self.fallbacks.subscribe()
    }

    pub fn subscribe_records(&self) -> Subscription<HealthRecords> {
        self.published_records.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.lock().is_some()
    }

    /// Spawn the background probe loop. The first round runs immediately.
    pub fn start(self: &Arc<Self>) {
        let mut slot = self.shutdown.lock();
        if slot.is_some() {
            debug!("Health manager already running");
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        *slot = Some(shutdown_tx);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        drop(slot);

        let manager = Arc::clone(self);
        let mut connectivity = self.connectivity.watch();
        connectivity.borrow_and_update();
        let probe_interval = self.config.probe_interval();

        info!(
            probe_interval_seconds = self.config.probe_interval_seconds,
            probe_timeout_seconds = self.config.probe_timeout_seconds,
            generation,
            "Starting health probe loop"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(probe_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        info!(generation, "Health probe loop shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        manager.run_probe_cycle().await;
                    }
                    changed = connectivity.changed() => {
                        if changed.is_err() {
                            warn!("Connectivity source closed, stopping health probe loop");
                            break;
                        }
                        connectivity.borrow_and_update();
                        manager.reevaluate_network().await;
                    }
                }
            }
            manager.finish_run(generation);
        });
    }

    pub fn stop(&self) {
        if let Some(shutdown_tx) = self.shutdown.lock().take() {
            // A loop mid-round sees the change as soon as it returns to select
            let _ = shutdown_tx.send(true);
        }
    }

    /// Clears the running state unless a newer loop has taken over
    fn finish_run(&self, generation: u64) {
        let mut slot = self.shutdown.lock();
        if self.generation.load(Ordering::SeqCst) == generation {
            *slot = None;
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn unhealthy_services(records: &HealthRecords) -> Vec<String> {
    records
        .values()
        .filter(|record| !record.is_healthy)
        .map(|record| record.service.clone())
        .collect()
}
