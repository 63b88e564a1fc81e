//! Work-item tracker client library
//!
//! An authenticated, rate-limited, TTL-caching client for a REST work-item
//! tracker. The modules are public so the binary and integration tests can
//! drive the client directly.

pub mod cache;
pub mod cli;
pub mod config;
pub mod limiter;
pub mod stats;
pub mod tracker;

pub use config::{ConfigError, Credentials, ServiceConfig};
pub use stats::UsageStats;
pub use tracker::{ItemFilter, RequestOutcome, TrackerClient, TrackerRequest, TrackerService};
