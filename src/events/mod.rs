//! # State Publication
//!
//! Push-style fan-out of health, snapshot and alert state to any number of
//! consumers (dashboards, loggers, voice front ends).

pub mod publisher;

pub use publisher::{StatePublisher, Subscription};
