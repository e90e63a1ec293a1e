//! Built-in executors shipped with the core

pub mod offline;

pub use offline::{OfflineExecutor, OfflineFactory};
