#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Relay Core
//!
//! Health-aware routing of natural-language and voice tasks across
//! interchangeable backend executors.
//!
//! ## Overview
//!
//! Three cooperating components make up the core:
//!
//! - **Router** selects a primary executor and ordered fallbacks per task type,
//!   dispatches under a deadline and tries at most one fallback.
//! - **Health Manager** probes every executor and the network on a fixed period,
//!   keeps per-service health records and derives a process-wide degradation level.
//! - **Performance Monitor** records every routed outcome, builds periodic health
//!   snapshots and raises deduplicated alerts.
//!
//! Everything else (dashboards, voice front ends, provider protocols) sits
//! outside and talks to the core through [`orchestration::RelayCore::orchestrate`]
//! and the published state subscriptions.
//!
//! ## Module Organization
//!
//! - [`config`] - Configuration tree and environment-aware loader
//! - [`constants`] - Task types, priorities, degradation levels and other enums
//! - [`error`] - Structured error handling
//! - [`events`] - Push-style state publication
//! - [`registry`] - Executor descriptors and lazy factories
//! - [`executors`] - Built-in offline executor
//! - [`orchestration`] - Router, strategy table and core wiring
//! - [`health`] - Health probes, records and fallback management
//! - [`monitor`] - Metrics, snapshots and alerting
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay_core::config::RelayConfig;
//! use relay_core::constants::{Priority, TaskType};
//! use relay_core::orchestration::{FactoryMap, RelayCore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! relay_core::logging::init_structured_logging();
//!
//! let core = RelayCore::from_config(RelayConfig::default(), FactoryMap::new())?;
//! core.start();
//!
//! let outcome = core
//!     .orchestrate("What should I do right now?", TaskType::Emergency, Priority::High, None)
//!     .await?;
//! println!("{} answered in {:?}", outcome.executor_used, outcome.response_time);
//!
//! let mut levels = core.health().subscribe_degradation_level();
//! while let Some(level) = levels.recv().await {
//!     println!("degradation level: {level}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod executors;
pub mod health;
pub mod logging;
pub mod monitor;
pub mod orchestration;
pub mod registry;

pub use config::{ConfigManager, RelayConfig};
pub use constants::{
    AlertSeverity, DegradationLevel, ErrorCategory, FallbackTier, OverallHealth, Priority,
    ServiceTier, TaskType,
};
pub use error::{RelayError, Result};
pub use events::{StatePublisher, Subscription};
pub use health::{HealthManager, ServiceHealthRecord};
pub use monitor::{Alert, PerformanceMetric, PerformanceMonitor, SystemHealthSnapshot};
pub use orchestration::{OrchestrationOutcome, RelayCore, Router, RoutingDecision};
pub use registry::{ExecutorDescriptor, ExecutorFactory, ExecutorRegistry, TaskExecutor};
