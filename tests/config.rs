//! Configuration loading from disk into a running core

use relay_core::config::{ConfigManager, ConfigurationError, RelayConfig};
use relay_core::constants::{Priority, TaskType};
use relay_core::orchestration::{FactoryMap, RelayCore};
use relay_core::registry::{ExecutorRequest, FnFactory, TaskExecutor};
use relay_core::RelayError;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::assert_ok;

const BASE: &str = r#"
router:
  min_timeout_ms: 100
  strategies:
    general_query: ["remote", "offline"]
    emergency: ["offline", "remote"]

executors:
  - name: remote
    kind: echo
    capabilities: ["general_query", "emergency"]
    avg_latency_ms: 800
    reliability: 0.95
  - name: offline
    kind: offline
    capabilities: ["general_query", "emergency"]
    avg_latency_ms: 20
    offline_capable: true

monitor:
  snapshot_interval_seconds: 5
  alerts:
    disabled_rules: ["multiple_fallbacks"]
"#;

const STAGING: &str = r#"
health:
  probe_interval_seconds: 10
monitor:
  window_seconds: 60
"#;

struct Echo;

#[async_trait::async_trait]
impl TaskExecutor for Echo {
    async fn execute(&self, request: &ExecutorRequest) -> anyhow::Result<String> {
        Ok(format!("echo: {}", request.original))
    }
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn echo_factories() -> FactoryMap {
    let mut factories = FactoryMap::new();
    let echo: Arc<dyn TaskExecutor> = Arc::new(Echo);
    factories.insert(
        "echo".to_string(),
        FnFactory::shared(move |_| Ok(echo.clone())),
    );
    factories
}

#[test]
fn test_environment_overlay_overrides_base_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "relay-config.yaml", BASE);
    write(dir.path(), "relay-config.staging.yaml", STAGING);

    let manager =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "staging").unwrap();
    let config = manager.config();

    assert_eq!(manager.environment(), "staging");
    assert_eq!(config.health.probe_interval_seconds, 10);
    assert_eq!(config.monitor.window_seconds, 60);
    // Untouched by the overlay
    assert_eq!(config.monitor.snapshot_interval_seconds, 5);
    assert_eq!(config.router.min_timeout_ms, 100);
    assert_eq!(config.router.timeout_multiplier, 2.0);
    assert_eq!(config.executors.len(), 2);

    let production =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "production").unwrap();
    assert_eq!(production.config().health.probe_interval_seconds, 30);
}

#[test]
fn test_core_loaded_from_disk_routes_through_supplied_factories() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "relay-config.yaml", BASE);

    let core = RelayCore::load(Some(dir.path().to_path_buf()), echo_factories()).unwrap();
    assert_eq!(core.registry().names(), vec!["remote", "offline"]);
    assert!(core
        .monitor()
        .config()
        .alerts
        .disabled_rules
        .contains(&"multiple_fallbacks".to_string()));

    let outcome = assert_ok!(tokio_test::block_on(core.orchestrate(
        "Is this recording legal?",
        TaskType::GeneralQuery,
        Priority::Medium,
        None,
    )));
    assert_eq!(outcome.executor_used, "remote");
    assert_eq!(outcome.response, "echo: Is this recording legal?");

    let outcome = assert_ok!(tokio_test::block_on(core.orchestrate(
        "I need help",
        TaskType::Emergency,
        Priority::Low,
        None,
    )));
    assert_eq!(outcome.executor_used, "offline");
}

#[test]
fn test_unknown_executor_kind_is_rejected_at_startup() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "relay-config.yaml", BASE);

    let err = RelayCore::load(Some(dir.path().to_path_buf()), FactoryMap::new()).unwrap_err();
    assert!(matches!(err, RelayError::Configuration(ref message) if message.contains("echo")));
}

#[test]
fn test_invalid_values_fail_validation() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "relay-config.yaml",
        r#"
health:
  success_smoothing: 0.1
  failure_smoothing: 1.5
"#,
    );

    let err = ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
        .unwrap_err();
    match err {
        ConfigurationError::InvalidValue { field, .. } => {
            assert_eq!(field, "health.failure_smoothing")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_task_type_in_strategy_table_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "relay-config.yaml",
        r#"
router:
  strategies:
    poetry: ["offline"]
"#,
    );

    let err = ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
        .unwrap_err();
    assert!(err.to_string().contains("poetry"));
}

#[test]
fn test_missing_directory_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nowhere");

    let manager = ConfigManager::load_or_default(Some(missing.clone())).unwrap();
    assert_eq!(manager.config_directory(), missing.as_path());

    let defaults = RelayConfig::default();
    assert_eq!(manager.config().executors.len(), defaults.executors.len());
    assert_eq!(manager.config().executors[0].name, "offline");
    assert_eq!(manager.config().router.strategies.len(), TaskType::ALL.len());
}

#[test]
fn test_malformed_file_is_not_silently_replaced_by_defaults() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "relay-config.yaml", "router: [not, a, map");

    let err = ConfigManager::load_or_default(Some(dir.path().to_path_buf())).unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidFormat { .. }));
}

#[test]
fn test_executor_listed_twice_in_one_strategy_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "relay-config.yaml",
        r#"
router:
  strategies:
    emergency: ["fast", "offline", "fast"]
"#,
    );

    let err = ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
        .unwrap_err();
    match err {
        ConfigurationError::InvalidValue { field, reason } => {
            assert_eq!(field, "router.strategies.emergency");
            assert!(reason.contains("'fast'"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}
