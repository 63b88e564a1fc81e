//! Command-line interface parsing for trackerctl
//!
//! Connection settings come from flags or `TRACKER_*` environment variables.
//! Each subcommand maps to one tracker operation.

use clap::{ArgAction, Parser, Subcommand};
use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, ServiceConfig};
use crate::tracker::ItemFilter;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The connection settings do not form a valid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// trackerctl - query a work-item tracker with caching and rate limiting
#[derive(Parser, Debug)]
#[command(name = "trackerctl")]
#[command(about = "Rate-limited, caching client for a REST work-item tracker")]
#[command(version)]
pub struct Cli {
    /// Base URL of the tracker (e.g. https://tracker.example.com/cb)
    #[arg(long, env = "TRACKER_URL")]
    pub url: Option<String>,

    /// Username for Basic authentication
    #[arg(long, env = "TRACKER_USERNAME")]
    pub username: Option<String>,

    /// Password for Basic authentication
    #[arg(long, env = "TRACKER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Verify TLS certificates
    #[arg(long, env = "TRACKER_SSL_VERIFY", default_value_t = true, action = ArgAction::Set)]
    pub ssl_verify: bool,

    /// Maximum calls admitted per 60 second window
    #[arg(
        long,
        env = "TRACKER_MAX_CALLS_PER_MINUTE",
        default_value_t = 60,
        allow_negative_numbers = true
    )]
    pub max_calls_per_minute: i64,

    /// Default cache TTL in seconds
    #[arg(long, env = "TRACKER_CACHE_TTL", default_value_t = 300)]
    pub cache_ttl: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "TRACKER_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Print usage statistics to stderr when done
    #[arg(long)]
    pub stats: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Tracker operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List projects
    Projects {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 100)]
        page_size: u32,
    },
    /// List the items of a tracker
    Items {
        tracker_id: u64,
        #[arg(long, default_value_t = 500)]
        max_items: u32,
    },
    /// Fetch one or more items by id
    Item {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Query items by project, tracker and status
    Query {
        /// Project ids, comma separated
        #[arg(long = "project", value_delimiter = ',')]
        projects: Vec<u64>,
        /// Tracker ids, comma separated
        #[arg(long = "tracker", value_delimiter = ',')]
        trackers: Vec<u64>,
        /// Status names, comma separated
        #[arg(long = "status", value_delimiter = ',')]
        statuses: Vec<String>,
        #[arg(long, default_value_t = 100)]
        max_results: u32,
    },
    /// Find the first item whose name contains a label
    Search { label: String },
    /// Check connectivity and credentials
    Check,
}

impl Command {
    /// Builds the item filter for a `query` subcommand
    ///
    /// # Returns
    /// * `Some(ItemFilter)` for `Command::Query`
    /// * `None` for every other subcommand
    pub fn item_filter(&self) -> Option<ItemFilter> {
        match self {
            Command::Query {
                projects,
                trackers,
                statuses,
                ..
            } => Some(
                ItemFilter::new()
                    .projects(projects.iter().copied())
                    .trackers(trackers.iter().copied())
                    .statuses(statuses.iter().cloned()),
            ),
            _ => None,
        }
    }
}

impl Cli {
    /// Creates a ServiceConfig from the parsed connection settings.
    ///
    /// # Returns
    /// * `Ok(ServiceConfig)` when URL, credentials and limits are valid
    /// * `Err(CliError)` describing the first invalid setting
    pub fn service_config(&self) -> Result<ServiceConfig, CliError> {
        let config = ServiceConfig::builder(self.url.clone().unwrap_or_default())
            .credentials(
                self.username.clone().unwrap_or_default(),
                self.password.clone().unwrap_or_default(),
            )
            .verify_tls(self.ssl_verify)
            .max_calls_per_window(self.max_calls_per_minute)
            .default_ttl(Duration::from_secs(self.cache_ttl))
            .timeout(Duration::from_secs(self.timeout))
            .build()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONNECTION: [&str; 7] = [
        "trackerctl",
        "--url",
        "https://tracker.example.com",
        "--username",
        "alice",
        "--password",
        "pw",
    ];

    fn parse(extra: &[&str]) -> Cli {
        Cli::parse_from(CONNECTION.iter().chain(extra.iter()).copied())
    }

    #[test]
    fn test_cli_parse_projects_defaults() {
        let cli = parse(&["projects"]);

        assert_eq!(cli.command, Command::Projects { page: 1, page_size: 100 });
        assert_eq!(cli.max_calls_per_minute, 60);
        assert!(cli.ssl_verify);
        assert!(!cli.stats);
    }

    #[test]
    fn test_cli_parse_item_ids() {
        let cli = parse(&["item", "1", "2", "3"]);

        assert_eq!(cli.command, Command::Item { ids: vec![1, 2, 3] });
    }

    #[test]
    fn test_cli_parse_ssl_verify_false() {
        let cli = parse(&["--ssl-verify", "false", "check"]);

        assert!(!cli.ssl_verify);
        assert!(!cli.service_config().unwrap().verify_tls());
    }

    #[test]
    fn test_query_builds_filter() {
        let cli = parse(&["query", "--project", "1,2", "--status", "Open"]);
        let filter = cli.command.item_filter().unwrap();

        assert_eq!(
            filter.to_query_string(),
            "project.id IN (1, 2) AND status IN ('Open')"
        );
    }

    #[test]
    fn test_query_without_filters_matches_all() {
        let cli = parse(&["query"]);

        assert_eq!(
            cli.command.item_filter().unwrap().to_query_string(),
            "project.id > 0"
        );
    }

    #[test]
    fn test_non_query_has_no_filter() {
        assert!(parse(&["check"]).command.item_filter().is_none());
    }

    #[test]
    fn test_service_config_from_cli() {
        let cli = parse(&["--max-calls-per-minute", "10", "--cache-ttl", "60", "check"]);
        let config = cli.service_config().unwrap();

        assert_eq!(config.max_calls_per_window(), 10);
        assert_eq!(config.default_ttl(), Duration::from_secs(60));
        assert_eq!(config.credentials().username(), "alice");
    }

    #[test]
    fn test_service_config_rejects_negative_limit() {
        let cli = parse(&["--max-calls-per-minute", "-1", "check"]);
        let err = cli.service_config().unwrap_err();

        assert!(err.to_string().contains("Invalid rate limit"));
    }
}
