//! # Service Health Records
//!
//! Per-service health state and the pure functions that derive degradation
//! labels from it. Nothing here performs I/O; the manager feeds probe outcomes
//! in and publishes what comes out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{DegradationThresholds, HealthConfig};
use crate::constants::DegradationLevel;

/// Result of one probe against one service
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub success: bool,
    pub response_time_ms: u64,
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn success(response_time_ms: u64) -> Self {
        Self {
            success: true,
            response_time_ms,
            error: None,
        }
    }

    pub fn failure(response_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            response_time_ms,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealthRecord {
    pub service: String,
    pub is_healthy: bool,
    pub last_check: Option<DateTime<Utc>>,
    pub response_time_ms: u64,
    /// Exponentially smoothed failure ratio in [0, 1]
    pub error_rate: f64,
    pub degradation: DegradationLevel,
    pub last_error: Option<String>,
}

impl ServiceHealthRecord {
    /// Cold-start record: assumed healthy until a probe says otherwise
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            is_healthy: true,
            last_check: None,
            response_time_ms: 0,
            error_rate: 0.0,
            degradation: DegradationLevel::Normal,
            last_error: None,
        }
    }

    pub fn apply_probe(&mut self, outcome: &ProbeOutcome, config: &HealthConfig) {
        self.apply_probe_at(outcome, config, Utc::now());
    }

    pub fn apply_probe_at(
        &mut self,
        outcome: &ProbeOutcome,
        config: &HealthConfig,
        checked_at: DateTime<Utc>,
    ) {
        self.is_healthy = outcome.success;
        self.last_check = Some(checked_at);
        self.response_time_ms = outcome.response_time_ms;
        self.error_rate = smoothed_error_rate(
            self.error_rate,
            outcome.success,
            config.success_smoothing,
            config.failure_smoothing,
        );
        self.last_error = outcome.error.clone();
        self.degradation = classify_record(
            self.is_healthy,
            self.error_rate,
            self.response_time_ms,
            &config.thresholds,
        );
    }
}

/// Exponential moving average of failures. Failures pull toward 1, successes toward 0.
pub fn smoothed_error_rate(
    current: f64,
    success: bool,
    success_smoothing: f64,
    failure_smoothing: f64,
) -> f64 {
    let next = if success {
        current * (1.0 - success_smoothing)
    } else {
        current * (1.0 - failure_smoothing) + failure_smoothing
    };
    next.clamp(0.0, 1.0)
}

/// Degradation label of a single record
pub fn classify_record(
    is_healthy: bool,
    error_rate: f64,
    response_time_ms: u64,
    thresholds: &DegradationThresholds,
) -> DegradationLevel {
    if !is_healthy && error_rate > thresholds.emergency_error_rate {
        DegradationLevel::EmergencyOnly
    } else if error_rate > thresholds.limited_error_rate
        || response_time_ms > thresholds.limited_latency_ms
    {
        DegradationLevel::Limited
    } else if error_rate > thresholds.degraded_error_rate
        || response_time_ms > thresholds.degraded_latency_ms
    {
        DegradationLevel::Degraded
    } else {
        DegradationLevel::Normal
    }
}

/// Process-wide level from the full set of records
pub fn compute_global_level<'a>(
    records: impl IntoIterator<Item = &'a ServiceHealthRecord>,
    thresholds: &DegradationThresholds,
) -> DegradationLevel {
    let mut unhealthy = 0usize;
    let mut degraded = 0usize;
    let mut any_emergency = false;

    for record in records {
        if !record.is_healthy {
            unhealthy += 1;
        }
        match record.degradation {
            DegradationLevel::EmergencyOnly => any_emergency = true,
            DegradationLevel::Limited | DegradationLevel::Degraded => degraded += 1,
            DegradationLevel::Normal => {}
        }
    }

    if any_emergency || unhealthy >= thresholds.emergency_unhealthy_count {
        DegradationLevel::EmergencyOnly
    } else if unhealthy >= 1 || degraded >= thresholds.limited_degraded_count {
        DegradationLevel::Limited
    } else if degraded >= 1 {
        DegradationLevel::Degraded
    } else {
        DegradationLevel::Normal
    }
}
