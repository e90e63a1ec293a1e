//! # Structured Logging Module
//!
//! Environment-aware structured logging plus helpers that give routing,
//! health and alert events a consistent field layout.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants::{AlertSeverity, DegradationLevel};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// `RUST_LOG` wins over the environment default; `RELAY_LOG_FORMAT=json`
/// switches console output to JSON lines.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var("RELAY_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let console = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // An embedding application may already own the global subscriber
        if tracing_subscriber::registry().with(console).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("RELAY_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log the outcome of building a routing decision
pub fn log_routing_decision(
    task_type: &str,
    priority: &str,
    selected: &str,
    fallbacks: &[String],
    reasoning: &str,
) {
    tracing::info!(
        task_type = %task_type,
        priority = %priority,
        selected = %selected,
        fallbacks = ?fallbacks,
        reasoning = %reasoning,
        timestamp = %Utc::now().to_rfc3339(),
        "ROUTING_DECISION"
    );
}

/// Log a change of the process-wide degradation level
pub fn log_health_transition(
    previous: DegradationLevel,
    current: DegradationLevel,
    unhealthy_services: &[String],
    forced: bool,
) {
    if current > previous {
        tracing::warn!(
            previous = %previous,
            current = %current,
            unhealthy = ?unhealthy_services,
            forced = forced,
            timestamp = %Utc::now().to_rfc3339(),
            "HEALTH_TRANSITION"
        );
    } else {
        tracing::info!(
            previous = %previous,
            current = %current,
            unhealthy = ?unhealthy_services,
            forced = forced,
            timestamp = %Utc::now().to_rfc3339(),
            "HEALTH_TRANSITION"
        );
    }
}

/// Log a newly raised alert at a level matching its severity
pub fn log_alert(rule_id: &str, severity: AlertSeverity, title: &str, description: &str) {
    match severity {
        AlertSeverity::Critical => tracing::error!(
            rule_id = %rule_id,
            title = %title,
            description = %description,
            timestamp = %Utc::now().to_rfc3339(),
            "ALERT"
        ),
        AlertSeverity::Warning => tracing::warn!(
            rule_id = %rule_id,
            title = %title,
            description = %description,
            timestamp = %Utc::now().to_rfc3339(),
            "ALERT"
        ),
        AlertSeverity::Info => tracing::info!(
            rule_id = %rule_id,
            title = %title,
            description = %description,
            timestamp = %Utc::now().to_rfc3339(),
            "ALERT"
        ),
    }
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
        log_routing_decision("fast_response", "high", "fast", &[], "test");
    }
}
