//! # Health and Fallback Management
//!
//! Periodic probing of every backend executor and of network reachability,
//! per-service health records, the process-wide degradation level and the
//! fallback tiers it activates.
//!
//! ## Architecture
//!
//! ```text
//! HealthManager
//! ├── HealthProbe            (ExecutorProbe per executor, NetworkProbe)
//! ├── ServiceHealthRecord    (EMA error rate + per-record label)
//! ├── compute_global_level   (pure: records -> DegradationLevel)
//! ├── ConnectivityMonitor    (online/offline transitions, immediate re-evaluation)
//! └── StatePublisher         (level, emergency flag, fallback tiers, records)
//! ```

pub mod connectivity;
pub mod fallback;
pub mod manager;
pub mod probe;
pub mod record;

pub use connectivity::ConnectivityMonitor;
pub use fallback::{
    fallback_strategies, recommend, strategy_for, FallbackStrategy, ServiceRecommendation,
};
pub use manager::{HealthManager, HealthRecords};
pub use probe::{ExecutorProbe, HealthProbe, NetworkProbe};
pub use record::{
    classify_record, compute_global_level, smoothed_error_rate, ProbeOutcome, ServiceHealthRecord,
};
