//! # Performance Monitoring
//!
//! Metric ingestion, periodic system health snapshots, resource sampling and
//! rule-based alerting.
//!
//! ```text
//! Router ──record_metrics──> MetricsBuffer (ring)
//!                                 │ every snapshot interval
//!                                 v
//!                       SystemHealthSnapshot ──> AlertManager ──> Alert
//!                                 │
//!                                 └──> ExecutorRegistry feedback
//! ```

pub mod alerts;
pub mod metrics;
pub mod performance_monitor;
pub mod resources;
pub mod snapshot;

pub use alerts::{default_rules, Alert, AlertManager, AlertRule};
pub use metrics::{MetricsBuffer, PerformanceMetric};
pub use performance_monitor::PerformanceMonitor;
pub use resources::{FixedResourceSampler, ResourceSampler, ResourceUsage, SystemResourceSampler};
pub use snapshot::{build_snapshot, classify_overall, ExecutorPerformance, SystemHealthSnapshot};
