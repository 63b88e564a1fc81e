//! Replaceable handle to the active tracker client
//!
//! Collaborators hold a `TrackerService` and ask it for the current client.
//! Reconfiguring swaps in a freshly constructed client; requests already in
//! flight keep using the client they started with, and the old cache and rate
//! window are discarded with it.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::client::TrackerClient;
use super::outcome::RequestOutcome;
use crate::config::{ConfigError, ServiceConfig};
use crate::stats::UsageStats;

/// Result of a connectivity check
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub message: String,
    /// Client stats after the check, when a client is configured
    pub stats: Option<UsageStats>,
    pub checked_at: DateTime<Utc>,
}

/// Holder for the currently configured client
#[derive(Debug)]
pub struct TrackerService {
    client: ArcSwapOption<TrackerClient>,
}

impl Default for TrackerService {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerService {
    /// Creates an unconfigured service
    pub fn new() -> Self {
        Self {
            client: ArcSwapOption::empty(),
        }
    }

    /// Creates a service that starts with a client for `config`
    pub fn with_config(config: ServiceConfig) -> Result<Self, ConfigError> {
        let service = Self::new();
        service.configure(config)?;
        Ok(service)
    }

    /// Builds a new client and makes it current
    ///
    /// On error the previous client, if any, stays in place.
    pub fn configure(&self, config: ServiceConfig) -> Result<Arc<TrackerClient>, ConfigError> {
        let client = Arc::new(TrackerClient::new(config)?);
        let previous = self.client.swap(Some(Arc::clone(&client)));
        if previous.is_some() {
            info!(base_url = client.config().base_url(), "tracker client replaced");
        }
        Ok(client)
    }

    /// The active client, or `None` before the first `configure`
    pub fn current(&self) -> Option<Arc<TrackerClient>> {
        self.client.load_full()
    }

    pub fn is_configured(&self) -> bool {
        self.client.load().is_some()
    }

    /// Lists a single project to verify URL, credentials and TLS settings
    pub async fn check_connection(&self) -> ConnectionReport {
        let Some(client) = self.current() else {
            return ConnectionReport {
                success: false,
                message: "Tracker not configured".to_string(),
                stats: None,
                checked_at: Utc::now(),
            };
        };

        let outcome = client.list_projects(1, 1).await;
        let (success, message) = match outcome {
            RequestOutcome::Success(_) => (true, "Connection successful".to_string()),
            RequestOutcome::ApiError { message, .. } | RequestOutcome::TransportError { message } => {
                (false, message)
            }
        };

        ConnectionReport {
            success,
            message,
            stats: Some(client.stats()),
            checked_at: Utc::now(),
        }
    }
}
