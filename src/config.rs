//! Connection configuration for the tracker client
//!
//! A `ServiceConfig` is validated once at construction and never mutated.
//! Reconfiguring means building a new config and a new client from it.

use reqwest::Url;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default number of calls admitted per 60 second window
pub const DEFAULT_MAX_CALLS_PER_WINDOW: u32 = 60;

/// Default time-to-live for cached read responses
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default per-attempt request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while building a configuration or a client
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The rate limiter bound is zero or negative
    #[error("Invalid rate limit: {0}. At least one call per window must be allowed")]
    InvalidRateLimit(i64),

    /// A credential field is empty or absent
    #[error("Missing credentials: {0} is required")]
    MissingCredentials(&'static str),

    /// No base URL was supplied
    #[error("Missing base URL: the tracker URL is required")]
    MissingBaseUrl,

    /// The base URL could not be parsed or uses an unsupported scheme
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Username and password used for HTTP Basic authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair, rejecting empty fields
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let username = username.into();
        let password = password.into();

        if username.trim().is_empty() {
            return Err(ConfigError::MissingCredentials("username"));
        }
        if password.is_empty() {
            return Err(ConfigError::MissingCredentials("password"));
        }

        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Immutable connection descriptor for one tracker instance
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL without a trailing slash
    base_url: String,
    credentials: Credentials,
    /// Whether TLS certificates are verified
    verify_tls: bool,
    /// Upper bound on calls admitted per 60 second window
    max_calls_per_window: u32,
    /// TTL applied to cached reads without an override
    default_ttl: Duration,
    /// Per-attempt timeout applied to every request
    timeout: Duration,
}

impl ServiceConfig {
    /// Starts building a configuration for the tracker at `base_url`
    pub fn builder(base_url: impl Into<String>) -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            base_url: base_url.into(),
            username: None,
            password: None,
            verify_tls: true,
            max_calls_per_window: i64::from(DEFAULT_MAX_CALLS_PER_WINDOW),
            default_ttl: DEFAULT_CACHE_TTL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn max_calls_per_window(&self) -> u32 {
        self.max_calls_per_window
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builder for `ServiceConfig`; all validation happens in `build`
#[derive(Debug, Clone)]
pub struct ServiceConfigBuilder {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    verify_tls: bool,
    max_calls_per_window: i64,
    default_ttl: Duration,
    timeout: Duration,
}

impl ServiceConfigBuilder {
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Sets the rate limiter bound. Values below one are rejected by `build`.
    pub fn max_calls_per_window(mut self, max_calls: i64) -> Self {
        self.max_calls_per_window = max_calls;
        self
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the settings and produces the configuration
    ///
    /// # Returns
    /// * `Ok(ServiceConfig)` if every field is valid
    /// * `Err(ConfigError)` for a missing or malformed URL, missing
    ///   credentials, or a rate limit below one
    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }

        let parsed = Url::parse(&base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let credentials = Credentials::new(
            self.username.unwrap_or_default(),
            self.password.unwrap_or_default(),
        )?;

        let max_calls_per_window = u32::try_from(self.max_calls_per_window)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::InvalidRateLimit(self.max_calls_per_window))?;

        Ok(ServiceConfig {
            base_url,
            credentials,
            verify_tls: self.verify_tls,
            max_calls_per_window,
            default_ttl: self.default_ttl,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_builder() -> ServiceConfigBuilder {
        ServiceConfig::builder("https://tracker.example.com/cb/").credentials("alice", "s3cret")
    }

    #[test]
    fn test_build_applies_defaults() {
        let config = valid_builder().build().unwrap();

        assert_eq!(config.base_url(), "https://tracker.example.com/cb");
        assert_eq!(config.max_calls_per_window(), DEFAULT_MAX_CALLS_PER_WINDOW);
        assert_eq!(config.default_ttl(), DEFAULT_CACHE_TTL);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.verify_tls());
        assert_eq!(config.credentials().username(), "alice");
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let result = valid_builder().max_calls_per_window(0).build();

        assert!(matches!(result, Err(ConfigError::InvalidRateLimit(0))));
    }

    #[test]
    fn test_negative_rate_limit_is_rejected() {
        let err = valid_builder().max_calls_per_window(-5).build().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidRateLimit(-5)));
        assert!(err.to_string().contains("Invalid rate limit"));
    }

    #[test]
    fn test_missing_username_is_rejected() {
        let result = ServiceConfig::builder("https://tracker.example.com")
            .credentials("", "pw")
            .build();

        assert!(matches!(result, Err(ConfigError::MissingCredentials("username"))));
    }

    #[test]
    fn test_absent_credentials_are_rejected() {
        let result = ServiceConfig::builder("https://tracker.example.com").build();

        assert!(matches!(result, Err(ConfigError::MissingCredentials(_))));
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let result = ServiceConfig::builder("  ").credentials("a", "b").build();

        assert!(matches!(result, Err(ConfigError::MissingBaseUrl)));
    }

    #[test]
    fn test_unsupported_scheme_is_rejected() {
        let result = ServiceConfig::builder("ftp://tracker.example.com")
            .credentials("a", "b")
            .build();

        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn test_debug_redacts_password() {
        let credentials = Credentials::new("alice", "s3cret").unwrap();
        let rendered = format!("{:?}", credentials);

        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("s3cret"));
    }
}
