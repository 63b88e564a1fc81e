//! Authenticated, rate-limited, caching tracker client
//!
//! Every request goes through the same pipeline: cacheable reads are looked up
//! by fingerprint first; anything else waits for admission from the rate
//! limiter, is sent with Basic authentication, and is classified into a
//! `RequestOutcome`. Successful cacheable reads are stored before returning.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::outcome::RequestOutcome;
use super::query::ItemFilter;
use super::request::{Endpoint, RequestOptions, TrackerRequest};
use crate::cache::{fingerprint, CacheStore};
use crate::config::{ConfigError, ServiceConfig};
use crate::limiter::RateLimiter;
use crate::stats::{UsageCounters, UsageStats};

/// Client for one configured tracker instance
///
/// Share it across tasks by reference or behind an `Arc`. Cache, rate window
/// and counters live as long as the client; a new configuration means a new
/// client.
#[derive(Debug)]
pub struct TrackerClient {
    http: Client,
    config: ServiceConfig,
    cache: CacheStore,
    limiter: RateLimiter,
    counters: Arc<UsageCounters>,
}

impl TrackerClient {
    /// Creates a client for the given configuration
    ///
    /// # Returns
    /// * `Err(ConfigError)` if the rate limit is invalid or the HTTP client
    ///   cannot be built
    pub fn new(config: ServiceConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls())
            .build()?;
        let limiter = RateLimiter::new(config.max_calls_per_window())?;
        let counters = Arc::new(UsageCounters::new());

        info!(
            base_url = config.base_url(),
            max_calls_per_window = config.max_calls_per_window(),
            verify_tls = config.verify_tls(),
            "tracker client configured"
        );

        Ok(Self {
            http,
            cache: CacheStore::new(Arc::clone(&counters)),
            limiter,
            counters,
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Executes a request, trying declared fallbacks after API errors
    ///
    /// Each fallback attempt is a full call: it is admitted by the rate
    /// limiter and counted in the stats. Transport errors end the attempt
    /// chain immediately.
    pub async fn dispatch(&self, request: TrackerRequest) -> RequestOutcome {
        let TrackerRequest {
            endpoint,
            fallbacks,
            options,
        } = request;

        let mut outcome = self.execute(&endpoint, &options).await;
        for fallback in &fallbacks {
            if !outcome.is_api_error() {
                break;
            }
            warn!(
                failed = %endpoint.normalized_path(),
                status = outcome.status(),
                fallback = %fallback.normalized_path(),
                "primary endpoint failed, trying fallback"
            );
            outcome = self.execute(fallback, &options).await;
        }
        outcome
    }

    async fn execute(&self, endpoint: &Endpoint, options: &RequestOptions) -> RequestOutcome {
        let path = endpoint.normalized_path();
        let cache_key = (options.cacheable && endpoint.is_read())
            .then(|| fingerprint(&path, &endpoint.query));

        if let Some(ref key) = cache_key {
            if let Some(cached) = self.cache.lookup(key) {
                return RequestOutcome::Success(cached);
            }
        }

        self.limiter.acquire().await;
        self.counters.record_call();

        let outcome = self.send(&path, endpoint, options).await;

        if let (Some(key), RequestOutcome::Success(value)) = (cache_key, &outcome) {
            let ttl = options
                .ttl_override
                .filter(|ttl| !ttl.is_zero())
                .unwrap_or(self.config.default_ttl());
            self.cache.insert(key, value.clone(), ttl);
        }
        outcome
    }

    async fn send(&self, path: &str, endpoint: &Endpoint, options: &RequestOptions) -> RequestOutcome {
        let url = format!("{}{}", self.config.base_url(), path);
        debug!(method = %endpoint.method, url = %url, "tracker request");

        let credentials = self.config.credentials();
        let mut builder = self
            .http
            .request(endpoint.method.clone(), &url)
            .basic_auth(credentials.username(), Some(credentials.password()))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if !endpoint.query.is_empty() {
            builder = builder.query(&endpoint.query);
        }
        if let Some(ref body) = endpoint.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        for (name, value) in &options.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let outcome = RequestOutcome::from_transport(&e);
                warn!(url = %url, error = outcome.error_message(), "tracker request failed");
                return outcome;
            }
        };

        let status = response.status();
        let outcome = match response.text().await {
            Ok(body) => RequestOutcome::from_response(status, body),
            Err(e) => RequestOutcome::from_transport(&e),
        };

        if let Some(message) = outcome.error_message() {
            warn!(url = %url, status = status.as_u16(), error = message, "tracker request failed");
        }
        outcome
    }

    /// One page of projects, falling back to the versioned listing
    pub async fn list_projects(&self, page: u32, page_size: u32) -> RequestOutcome {
        self.dispatch(TrackerRequest::list_projects(page, page_size)).await
    }

    /// Items of one tracker
    pub async fn tracker_items(&self, tracker_id: u64, max_items: u32) -> RequestOutcome {
        self.dispatch(TrackerRequest::tracker_items(tracker_id, max_items))
            .await
    }

    /// The `items` array of a tracker, empty on any failure
    pub async fn tracker_item_list(&self, tracker_id: u64, max_items: u32) -> Vec<Value> {
        match self.tracker_items(tracker_id, max_items).await {
            RequestOutcome::Success(Value::Object(mut body)) => match body.remove("items") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// A single item by id
    pub async fn item(&self, item_id: u64) -> RequestOutcome {
        self.dispatch(TrackerRequest::item(item_id)).await
    }

    /// Items matching a structured filter
    pub async fn query_items(&self, filter: &ItemFilter, max_results: u32) -> RequestOutcome {
        self.dispatch(TrackerRequest::query_items(filter, max_results))
            .await
    }

    /// First item whose name contains `label`
    ///
    /// # Returns
    /// * `Ok(Some(item))` for the first match
    /// * `Ok(None)` if the query succeeded without matches
    /// * `Err(outcome)` with the failed outcome otherwise
    pub async fn search_by_name(&self, label: &str) -> Result<Option<Value>, RequestOutcome> {
        match self.dispatch(TrackerRequest::search_by_name(label, 1)).await {
            RequestOutcome::Success(body) => Ok(body
                .get("items")
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .cloned()),
            failed => Err(failed),
        }
    }

    /// Snapshot of usage counters
    pub fn stats(&self) -> UsageStats {
        self.counters.snapshot(self.cache.len())
    }

    /// Drops every cached response
    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("tracker cache cleared");
    }
}
