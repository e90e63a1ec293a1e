//! # Orchestration
//!
//! The `orchestrate` entry point and everything it needs to pick an executor.
//!
//! ```text
//! caller ──> Router::orchestrate
//!              ├── StrategyTable / latency_first   (preference)
//!              ├── HealthManager                    (eligibility)
//!              ├── ExecutorRegistry::resolve        (lazy handle)
//!              ├── tokio::time::timeout             (bounded call, one fallback)
//!              └── PerformanceMonitor::record_metrics
//! ```
//!
//! [`RelayCore`] wires the components together from a [`crate::config::RelayConfig`].

pub mod core;
pub mod router;
pub mod strategy;
pub mod types;

pub use self::core::{FactoryMap, RelayCore};
pub use router::Router;
pub use strategy::{latency_first, shape_request, StrategyTable};
pub use types::{OrchestrationContext, OrchestrationOutcome, RoutingDecision};
