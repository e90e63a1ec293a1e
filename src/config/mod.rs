//! # Relay Configuration System
//!
//! Typed configuration for the router, the executor descriptors, the health
//! manager and the performance monitor. Every section carries defaults so a
//! process can start cold without any file on disk; files and environment
//! variables only override.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use relay_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let interval = manager.config().health.probe_interval();
//! println!("probing every {interval:?}");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::constants::{services, TaskType};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring relay-config.yaml
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    pub router: RouterConfig,
    /// Declared executors; a file that lists any replaces the built-in offline entry
    pub executors: Vec<ExecutorConfig>,
    pub health: HealthConfig,
    pub monitor: MonitorConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            router: RouterConfig::default(),
            executors: vec![ExecutorConfig::builtin_offline()],
            health: HealthConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Per-call deadline as a multiple of the executor's configured latency
    pub timeout_multiplier: f64,
    /// Lower bound for the per-call deadline
    pub min_timeout_ms: u64,
    /// Ordered executor preference per task type (keys are task type names)
    pub strategies: HashMap<String, Vec<String>>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        let table: [(TaskType, &[&str]); 7] = [
            (TaskType::LegalAnalysis, &["reasoning", "general", "offline"]),
            (TaskType::DocumentAnalysis, &["reasoning", "general"]),
            (TaskType::GeneralQuery, &["general", "fast", "offline"]),
            (TaskType::FastResponse, &["fast", "general", "offline"]),
            (TaskType::Emergency, &["fast", "offline", "general"]),
            (TaskType::VoiceRecognition, &["speech", "offline"]),
            (TaskType::TextToSpeech, &["speech", "offline"]),
        ];

        Self {
            timeout_multiplier: 2.0,
            min_timeout_ms: 50,
            strategies: table
                .iter()
                .map(|(task_type, names)| {
                    (
                        task_type.as_str().to_string(),
                        names.iter().map(|name| name.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

/// One backend executor as declared in configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutorConfig {
    pub name: String,
    /// Factory key; `offline` is built in, other kinds are supplied by the embedder
    pub kind: String,
    /// Task type names this executor serves well, in order
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub avg_latency_ms: u64,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default = "default_reliability")]
    pub reliability: f64,
    #[serde(default)]
    pub offline_capable: bool,
}

fn default_reliability() -> f64 {
    0.9
}

impl ExecutorConfig {
    /// The rule-based executor every deployment gets unless overridden
    pub fn builtin_offline() -> Self {
        Self {
            name: "offline".to_string(),
            kind: services::OFFLINE_KIND.to_string(),
            capabilities: TaskType::ALL
                .iter()
                .map(|task_type| task_type.as_str().to_string())
                .collect(),
            avg_latency_ms: 50,
            unit_cost: 0.0,
            reliability: 0.7,
            offline_capable: true,
        }
    }

    pub fn parsed_capabilities(&self) -> ConfigResult<Vec<TaskType>> {
        self.capabilities
            .iter()
            .map(|name| {
                name.parse::<TaskType>().map_err(|_| {
                    ConfigurationError::invalid_value(
                        format!("executors.{}.capabilities", self.name),
                        format!("unknown task type '{name}'"),
                    )
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    pub probe_interval_seconds: u64,
    pub probe_timeout_seconds: u64,
    /// EMA factor pulling the error rate toward 0 after a successful probe
    pub success_smoothing: f64,
    /// EMA factor pulling the error rate toward 1 after a failed probe
    pub failure_smoothing: f64,
    pub thresholds: DegradationThresholds,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_interval_seconds: 30,
            probe_timeout_seconds: 5,
            success_smoothing: 0.1,
            failure_smoothing: 0.25,
            thresholds: DegradationThresholds::default(),
        }
    }
}

impl HealthConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }
}

/// Hand-tuned policy constants for per-record labels and the global level
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DegradationThresholds {
    pub emergency_error_rate: f64,
    pub limited_error_rate: f64,
    pub limited_latency_ms: u64,
    pub degraded_error_rate: f64,
    pub degraded_latency_ms: u64,
    /// Unhealthy services needed for a global `emergency_only`
    pub emergency_unhealthy_count: usize,
    /// Degraded records needed for a global `limited`
    pub limited_degraded_count: usize,
}

impl Default for DegradationThresholds {
    fn default() -> Self {
        Self {
            emergency_error_rate: 0.8,
            limited_error_rate: 0.5,
            limited_latency_ms: 5000,
            degraded_error_rate: 0.2,
            degraded_latency_ms: 2000,
            emergency_unhealthy_count: 2,
            limited_degraded_count: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub snapshot_interval_seconds: u64,
    /// Trailing window used for snapshot aggregation
    pub window_seconds: u64,
    pub metrics_capacity: usize,
    pub snapshot_capacity: usize,
    pub alert_capacity: usize,
    pub alert_cooldown_seconds: u64,
    /// EMA factor for descriptor latency/reliability feedback; 0 disables feedback
    pub feedback_smoothing: f64,
    pub health: SnapshotThresholds,
    pub alerts: AlertThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_seconds: 10,
            window_seconds: 300,
            metrics_capacity: 1000,
            snapshot_capacity: 100,
            alert_capacity: 50,
            alert_cooldown_seconds: 300,
            feedback_smoothing: 0.2,
            health: SnapshotThresholds::default(),
            alerts: AlertThresholds::default(),
        }
    }
}

impl MonitorConfig {
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_seconds)
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_seconds as i64)
    }

    pub fn alert_cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.alert_cooldown_seconds as i64)
    }
}

/// Thresholds classifying a snapshot as excellent/good/degraded/critical
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SnapshotThresholds {
    pub critical_success_rate: f64,
    pub critical_latency_ms: f64,
    pub degraded_success_rate: f64,
    pub degraded_latency_ms: f64,
    pub degraded_fallback_count: usize,
    pub excellent_success_rate: f64,
    pub excellent_latency_ms: f64,
}

impl Default for SnapshotThresholds {
    fn default() -> Self {
        Self {
            critical_success_rate: 0.7,
            critical_latency_ms: 5000.0,
            degraded_success_rate: 0.9,
            degraded_latency_ms: 2000.0,
            degraded_fallback_count: 2,
            excellent_success_rate: 0.95,
            excellent_latency_ms: 1000.0,
        }
    }
}

/// Parameters of the default alert rules
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub high_response_time_ms: f64,
    pub low_success_rate: f64,
    pub multiple_fallbacks: usize,
    /// Rule ids that start disabled
    pub disabled_rules: Vec<String>,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            high_response_time_ms: 3000.0,
            low_success_rate: 0.8,
            multiple_fallbacks: 2,
            disabled_rules: Vec::new(),
        }
    }
}

impl RelayConfig {
    /// Reject values that would make the router or the health math misbehave
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.router.timeout_multiplier > 0.0) {
            return Err(ConfigurationError::invalid_value(
                "router.timeout_multiplier",
                "must be positive",
            ));
        }
        for (task_type, names) in &self.router.strategies {
            task_type.parse::<TaskType>().map_err(|_| {
                ConfigurationError::invalid_value(
                    "router.strategies",
                    format!("unknown task type '{task_type}'"),
                )
            })?;
            if names.is_empty() {
                return Err(ConfigurationError::invalid_value(
                    format!("router.strategies.{task_type}"),
                    "preference list is empty",
                ));
            }
            let mut listed = HashSet::new();
            if let Some(duplicate) = names.iter().find(|name| !listed.insert(name.as_str())) {
                return Err(ConfigurationError::invalid_value(
                    format!("router.strategies.{task_type}"),
                    format!("executor '{duplicate}' is listed more than once"),
                ));
            }
        }

        let mut seen = HashSet::new();
        for executor in &self.executors {
            if executor.name.trim().is_empty() {
                return Err(ConfigurationError::invalid_value(
                    "executors.name",
                    "must not be empty",
                ));
            }
            if !seen.insert(executor.name.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    format!("executors.{}", executor.name),
                    "duplicate executor name",
                ));
            }
            if executor.name == services::NETWORK {
                return Err(ConfigurationError::invalid_value(
                    format!("executors.{}", executor.name),
                    "name is reserved for the network health record",
                ));
            }
            if !(0.0..=1.0).contains(&executor.reliability) {
                return Err(ConfigurationError::invalid_value(
                    format!("executors.{}.reliability", executor.name),
                    "must be within [0, 1]",
                ));
            }
            executor.parsed_capabilities()?;
        }

        check_smoothing("health.success_smoothing", self.health.success_smoothing)?;
        check_smoothing("health.failure_smoothing", self.health.failure_smoothing)?;
        check_positive("health.probe_interval_seconds", self.health.probe_interval_seconds)?;
        check_positive("health.probe_timeout_seconds", self.health.probe_timeout_seconds)?;

        let thresholds = &self.health.thresholds;
        if !(thresholds.degraded_error_rate <= thresholds.limited_error_rate
            && thresholds.limited_error_rate <= thresholds.emergency_error_rate)
        {
            return Err(ConfigurationError::invalid_value(
                "health.thresholds",
                "error rates must satisfy degraded <= limited <= emergency",
            ));
        }
        if thresholds.degraded_latency_ms > thresholds.limited_latency_ms {
            return Err(ConfigurationError::invalid_value(
                "health.thresholds",
                "degraded_latency_ms must not exceed limited_latency_ms",
            ));
        }

        let monitor = &self.monitor;
        check_positive("monitor.snapshot_interval_seconds", monitor.snapshot_interval_seconds)?;
        check_positive("monitor.window_seconds", monitor.window_seconds)?;
        check_positive("monitor.metrics_capacity", monitor.metrics_capacity as u64)?;
        check_positive("monitor.snapshot_capacity", monitor.snapshot_capacity as u64)?;
        check_positive("monitor.alert_capacity", monitor.alert_capacity as u64)?;
        if !(0.0..=1.0).contains(&monitor.feedback_smoothing) {
            return Err(ConfigurationError::invalid_value(
                "monitor.feedback_smoothing",
                "must be within [0, 1]",
            ));
        }

        Ok(())
    }
}

fn check_smoothing(field: &str, value: f64) -> ConfigResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigurationError::invalid_value(
            field,
            "must be within (0, 1]",
        ))
    }
}

fn check_positive(field: &str, value: u64) -> ConfigResult<()> {
    if value == 0 {
        Err(ConfigurationError::invalid_value(field, "must be greater than zero"))
    } else {
        Ok(())
    }
}
