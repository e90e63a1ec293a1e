//! # System Health Snapshots
//!
//! Pure aggregation of a metric window into a [`SystemHealthSnapshot`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::metrics::PerformanceMetric;
use super::resources::ResourceUsage;
use crate::config::SnapshotThresholds;
use crate::constants::{FallbackTier, OverallHealth};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorPerformance {
    pub executor: String,
    pub request_count: usize,
    pub avg_response_time_ms: f64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub overall_health: OverallHealth,
    pub avg_response_time_ms: f64,
    pub success_rate: f64,
    pub request_count: usize,
    pub active_fallbacks: Vec<FallbackTier>,
    /// Keyed by executor name
    pub executor_breakdown: BTreeMap<String, ExecutorPerformance>,
    pub resource_usage: ResourceUsage,
}

impl SystemHealthSnapshot {
    /// Snapshot of an idle system
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            overall_health: OverallHealth::Excellent,
            avg_response_time_ms: 0.0,
            success_rate: 1.0,
            request_count: 0,
            active_fallbacks: Vec::new(),
            executor_breakdown: BTreeMap::new(),
            resource_usage: ResourceUsage::default(),
        }
    }
}

/// Aggregate `metrics` (already filtered to the window) into a snapshot.
/// An empty window counts as fully successful with zero latency.
pub fn build_snapshot(
    timestamp: DateTime<Utc>,
    metrics: &[PerformanceMetric],
    active_fallbacks: Vec<FallbackTier>,
    resource_usage: ResourceUsage,
    thresholds: &SnapshotThresholds,
) -> SystemHealthSnapshot {
    let (avg_response_time_ms, success_rate) = averages(metrics.iter());

    let mut grouped: BTreeMap<&str, Vec<&PerformanceMetric>> = BTreeMap::new();
    for metric in metrics {
        grouped.entry(metric.executor.as_str()).or_default().push(metric);
    }
    let executor_breakdown = grouped
        .into_iter()
        .map(|(executor, group)| {
            let (avg, rate) = averages(group.iter().copied());
            (
                executor.to_string(),
                ExecutorPerformance {
                    executor: executor.to_string(),
                    request_count: group.len(),
                    avg_response_time_ms: avg,
                    success_rate: rate,
                },
            )
        })
        .collect();

    let overall_health = classify_overall(
        success_rate,
        avg_response_time_ms,
        active_fallbacks.len(),
        thresholds,
    );

    SystemHealthSnapshot {
        timestamp,
        overall_health,
        avg_response_time_ms,
        success_rate,
        request_count: metrics.len(),
        active_fallbacks,
        executor_breakdown,
        resource_usage,
    }
}

fn averages<'a>(metrics: impl Iterator<Item = &'a PerformanceMetric>) -> (f64, f64) {
    let (count, total_ms, successes) = metrics.fold((0usize, 0u64, 0usize), |acc, metric| {
        (
            acc.0 + 1,
            acc.1 + metric.response_time_ms,
            acc.2 + usize::from(metric.success),
        )
    });
    if count == 0 {
        return (0.0, 1.0);
    }
    (
        total_ms as f64 / count as f64,
        successes as f64 / count as f64,
    )
}

pub fn classify_overall(
    success_rate: f64,
    avg_response_time_ms: f64,
    active_fallback_count: usize,
    thresholds: &SnapshotThresholds,
) -> OverallHealth {
    if success_rate < thresholds.critical_success_rate
        || avg_response_time_ms > thresholds.critical_latency_ms
    {
        OverallHealth::Critical
    } else if success_rate < thresholds.degraded_success_rate
        || avg_response_time_ms > thresholds.degraded_latency_ms
        || active_fallback_count >= thresholds.degraded_fallback_count
    {
        OverallHealth::Degraded
    } else if success_rate >= thresholds.excellent_success_rate
        && avg_response_time_ms <= thresholds.excellent_latency_ms
        && active_fallback_count == 0
    {
        OverallHealth::Excellent
    } else {
        OverallHealth::Good
    }
}
