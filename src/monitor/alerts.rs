//! # Alerting
//!
//! Rule predicates over snapshots, cooldown-based deduplication and a bounded
//! alert history. Alerts are observational only.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

use super::snapshot::SystemHealthSnapshot;
use crate::config::AlertThresholds;
use crate::constants::{AlertSeverity, FallbackTier, OverallHealth};
use crate::logging::log_alert;

pub type AlertPredicate = Arc<dyn Fn(&SystemHealthSnapshot) -> bool + Send + Sync>;
pub type AlertDescriber = Arc<dyn Fn(&SystemHealthSnapshot) -> String + Send + Sync>;

#[derive(Clone)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub severity: AlertSeverity,
    pub enabled: bool,
    predicate: AlertPredicate,
    describe: AlertDescriber,
}

impl std::fmt::Debug for AlertRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertRule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("severity", &self.severity)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl AlertRule {
    pub fn new<P>(
        id: impl Into<String>,
        name: impl Into<String>,
        severity: AlertSeverity,
        predicate: P,
    ) -> Self
    where
        P: Fn(&SystemHealthSnapshot) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        let fallback_description = name.clone();
        Self {
            id: id.into(),
            name,
            severity,
            enabled: true,
            predicate: Arc::new(predicate),
            describe: Arc::new(move |_| fallback_description.clone()),
        }
    }

    pub fn with_description<D>(mut self, describe: D) -> Self
    where
        D: Fn(&SystemHealthSnapshot) -> String + Send + Sync + 'static,
    {
        self.describe = Arc::new(describe);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn matches(&self, snapshot: &SystemHealthSnapshot) -> bool {
        self.enabled && (self.predicate)(snapshot)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub rule_id: String,
    pub timestamp: DateTime<Utc>,
    pub severity: AlertSeverity,
    pub title: String,
    pub description: String,
    pub snapshot: SystemHealthSnapshot,
    pub acknowledged: bool,
}

/// Built-in rules parameterized by configuration
pub fn default_rules(thresholds: &AlertThresholds) -> Vec<AlertRule> {
    let high_latency = thresholds.high_response_time_ms;
    let low_success = thresholds.low_success_rate;
    let fallback_count = thresholds.multiple_fallbacks;

    let rules = vec![
        AlertRule::new(
            "high_response_time",
            "High Response Time",
            AlertSeverity::Warning,
            move |s| s.avg_response_time_ms > high_latency,
        )
        .with_description(move |s| {
            format!(
                "Average response time {:.0}ms exceeds {:.0}ms",
                s.avg_response_time_ms, high_latency
            )
        }),
        AlertRule::new(
            "low_success_rate",
            "Low Success Rate",
            AlertSeverity::Critical,
            move |s| s.success_rate < low_success,
        )
        .with_description(move |s| {
            format!(
                "Success rate {:.1}% is below {:.1}%",
                s.success_rate * 100.0,
                low_success * 100.0
            )
        }),
        AlertRule::new(
            "multiple_fallbacks",
            "Multiple Fallbacks Active",
            AlertSeverity::Warning,
            move |s| s.active_fallbacks.len() >= fallback_count,
        )
        .with_description(|s| format!("Active fallback tiers: {:?}", s.active_fallbacks)),
        AlertRule::new(
            "emergency_mode",
            "Emergency Mode Active",
            AlertSeverity::Critical,
            |s| s.active_fallbacks.contains(&FallbackTier::Emergency),
        )
        .with_description(|_| "System is operating in emergency-only mode".to_string()),
        AlertRule::new(
            "critical_health",
            "Critical System Health",
            AlertSeverity::Critical,
            |s| s.overall_health == OverallHealth::Critical,
        )
        .with_description(|s| {
            format!(
                "Overall health is critical: success rate {:.1}%, average response time {:.0}ms",
                s.success_rate * 100.0,
                s.avg_response_time_ms
            )
        }),
    ];

    rules
        .into_iter()
        .map(|rule| {
            let enabled = !thresholds.disabled_rules.contains(&rule.id);
            rule.enabled(enabled)
        })
        .collect()
}

#[derive(Debug)]
pub struct AlertManager {
    rules: Vec<AlertRule>,
    history: VecDeque<Alert>,
    capacity: usize,
    cooldown: Duration,
}

impl AlertManager {
    pub fn new(rules: Vec<AlertRule>, capacity: usize, cooldown: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            rules,
            history: VecDeque::with_capacity(capacity),
            capacity,
            cooldown,
        }
    }

    pub fn add_rule(&mut self, rule: AlertRule) {
        self.rules.retain(|existing| existing.id != rule.id);
        self.rules.push(rule);
    }

    /// Enable or disable a rule. Returns false for an unknown id.
    pub fn set_rule_enabled(&mut self, rule_id: &str, enabled: bool) -> bool {
        match self.rules.iter_mut().find(|rule| rule.id == rule_id) {
            Some(rule) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Evaluate every enabled rule and return the alerts raised
    pub fn evaluate(&mut self, snapshot: &SystemHealthSnapshot) -> Vec<Alert> {
        let mut raised = Vec::new();

        for rule in &self.rules {
            if !rule.matches(snapshot) {
                continue;
            }
            if self.in_cooldown(&rule.id, snapshot.timestamp) {
                tracing::debug!(rule_id = %rule.id, "Alert suppressed by cooldown");
                continue;
            }

            let alert = Alert {
                id: Uuid::new_v4(),
                rule_id: rule.id.clone(),
                timestamp: snapshot.timestamp,
                severity: rule.severity,
                title: rule.name.clone(),
                description: (rule.describe)(snapshot),
                snapshot: snapshot.clone(),
                acknowledged: false,
            };
            log_alert(&alert.rule_id, alert.severity, &alert.title, &alert.description);
            raised.push(alert);
        }

        for alert in &raised {
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(alert.clone());
        }

        raised
    }

    fn in_cooldown(&self, rule_id: &str, now: DateTime<Utc>) -> bool {
        self.history.iter().any(|alert| {
            alert.rule_id == rule_id && !alert.acknowledged && now - alert.timestamp < self.cooldown
        })
    }

    /// Returns whether an alert with this id was found
    pub fn acknowledge(&mut self, alert_id: Uuid) -> bool {
        match self.history.iter_mut().find(|alert| alert.id == alert_id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    pub fn history(&self) -> Vec<Alert> {
        self.history.iter().cloned().collect()
    }

    pub fn unacknowledged(&self) -> Vec<Alert> {
        self.history
            .iter()
            .filter(|alert| !alert.acknowledged)
            .cloned()
            .collect()
    }
}
