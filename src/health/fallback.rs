//! # Fallback Strategies
//!
//! Descriptive catalog of what each service tier can still do, and the
//! mapping from current degradation to the tier a caller should expect.

use serde::{Deserialize, Serialize};

use crate::constants::{DegradationLevel, Priority, ServiceTier, TaskType};

/// Human-readable description of one tier. Describes behavior, never computes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackStrategy {
    pub tier: ServiceTier,
    pub capabilities: Vec<String>,
    pub expected_response_ms: u64,
    pub reliability: f64,
}

/// Qualitative answer for callers that do not want raw health records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecommendation {
    pub service_tier: ServiceTier,
    pub capabilities: Vec<String>,
    pub expected_response_ms: u64,
    pub reliability: f64,
}

fn strategy(tier: ServiceTier, capabilities: &[&str], expected_response_ms: u64, reliability: f64) -> FallbackStrategy {
    FallbackStrategy {
        tier,
        capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        expected_response_ms,
        reliability,
    }
}

/// The strategy table, one entry per tier
pub fn fallback_strategies() -> Vec<FallbackStrategy> {
    vec![
        strategy(
            ServiceTier::Primary,
            &[
                "full_legal_analysis",
                "document_review",
                "voice_interaction",
                "real_time_guidance",
            ],
            1500,
            0.95,
        ),
        strategy(
            ServiceTier::Secondary,
            &["basic_legal_guidance", "document_summaries", "voice_interaction"],
            2500,
            0.85,
        ),
        strategy(
            ServiceTier::Offline,
            &["cached_legal_information", "emergency_scripts", "local_voice"],
            200,
            0.7,
        ),
        strategy(
            ServiceTier::Emergency,
            &["emergency_contacts", "incident_recording", "rights_reminders"],
            100,
            0.99,
        ),
    ]
}

pub fn strategy_for(tier: ServiceTier) -> FallbackStrategy {
    fallback_strategies()
        .into_iter()
        .find(|strategy| strategy.tier == tier)
        .unwrap_or_else(|| strategy(tier, &[], 0, 0.0))
}

/// Tier a request should expect given the current degradation
pub fn recommend(
    level: DegradationLevel,
    network_healthy: bool,
    task_type: TaskType,
    priority: Priority,
) -> ServiceRecommendation {
    let urgent = task_type == TaskType::Emergency && priority == Priority::High;

    let tier = match level {
        DegradationLevel::EmergencyOnly => ServiceTier::Emergency,
        DegradationLevel::Limited if urgent => ServiceTier::Emergency,
        DegradationLevel::Limited if !network_healthy => ServiceTier::Offline,
        DegradationLevel::Limited | DegradationLevel::Degraded => ServiceTier::Secondary,
        DegradationLevel::Normal => ServiceTier::Primary,
    };

    let FallbackStrategy {
        capabilities,
        expected_response_ms,
        reliability,
        ..
    } = strategy_for(tier);

    ServiceRecommendation {
        service_tier: tier,
        capabilities,
        expected_response_ms,
        reliability,
    }
}
