//! Remote work-item tracker client
//!
//! This module contains the request dispatcher and the convenience operations
//! built on it. Tracker payloads are passed through as opaque JSON values.

pub mod client;
pub mod outcome;
pub mod query;
pub mod request;
pub mod service;

pub use client::TrackerClient;
pub use outcome::RequestOutcome;
pub use query::{FilterValue, ItemFilter};
pub use request::{Endpoint, RequestOptions, TrackerRequest};
pub use service::{ConnectionReport, TrackerService};
