//! # Registry Infrastructure
//!
//! Registration, lazy construction and description of backend executors.
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── ExecutorFactory    (lazy construction seam, one per executor)
//! └── ExecutorRegistry   (descriptors + memoized live handles)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use relay_core::constants::TaskType;
//! use relay_core::executors::OfflineFactory;
//! use relay_core::registry::{ExecutorDescriptor, ExecutorRegistry};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ExecutorRegistry::new();
//! registry.register(
//!     ExecutorDescriptor::new("offline", vec![TaskType::Emergency], 50).offline_capable(true),
//!     Arc::new(OfflineFactory),
//! )?;
//!
//! let executor = registry.resolve("offline").await?;
//! # Ok(())
//! # }
//! ```

pub mod executor_factory;
pub mod executor_registry;

pub use executor_factory::{ExecutorFactory, ExecutorRequest, FnFactory, TaskExecutor};
pub use executor_registry::{ExecutorDescriptor, ExecutorRegistry};
