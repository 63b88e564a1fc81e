//! Request descriptions for the tracker dispatcher
//!
//! A `TrackerRequest` names a primary `Endpoint`, an ordered list of fallback
//! endpoints tried when the primary answers with an API error, and the
//! per-request `RequestOptions`.

use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;

use super::query::{escape_text, ItemFilter};

/// Largest page size the tracker accepts for project listings
pub const MAX_PAGE_SIZE: u32 = 500;

/// Project listings change rarely and are cached longer than the default
pub const PROJECTS_TTL: Duration = Duration::from_secs(600);

/// One concrete HTTP call against the tracker
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    /// Query parameters in insertion order
    pub query: Vec<(String, String)>,
    /// JSON request body
    pub body: Option<Value>,
}

impl Endpoint {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Path with exactly one leading `/`
    pub fn normalized_path(&self) -> String {
        format!("/{}", self.path.trim_start_matches('/'))
    }

    /// Only GET requests are idempotent reads
    pub fn is_read(&self) -> bool {
        self.method == Method::GET
    }
}

/// Per-request knobs
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    /// Overrides the client's per-attempt timeout
    pub timeout: Option<Duration>,
    /// Sent in addition to the authentication and JSON headers
    pub extra_headers: Vec<(String, String)>,
    /// Whether a successful read may be served from and stored in the cache
    pub cacheable: bool,
    /// Overrides the client's default TTL for this response. A zero duration
    /// means the default TTL.
    pub ttl_override: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            extra_headers: Vec::new(),
            cacheable: true,
            ttl_override: None,
        }
    }
}

/// A dispatchable request
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerRequest {
    pub endpoint: Endpoint,
    /// Tried in order while the previous attempt returned an API error
    pub fallbacks: Vec<Endpoint>,
    pub options: RequestOptions,
}

impl From<Endpoint> for TrackerRequest {
    fn from(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            fallbacks: Vec::new(),
            options: RequestOptions::default(),
        }
    }
}

impl TrackerRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        endpoint.into()
    }

    pub fn with_fallback(mut self, endpoint: Endpoint) -> Self {
        self.fallbacks.push(endpoint);
        self
    }

    pub fn without_fallbacks(mut self) -> Self {
        self.fallbacks.clear();
        self
    }

    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.options.cacheable = cacheable;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.options.ttl_override = Some(ttl);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.extra_headers.push((name.into(), value.into()));
        self
    }

    /// One page of projects
    ///
    /// Declares the versioned `/v3/projects` listing as a fallback for
    /// trackers that do not serve the legacy paged endpoint.
    pub fn list_projects(page: u32, page_size: u32) -> Self {
        let page_size = page_size.min(MAX_PAGE_SIZE);

        Self::new(Endpoint::get(format!("/rest/projects/page/{}", page)).with_query("pageSize", page_size))
            .with_fallback(
                Endpoint::get("/v3/projects")
                    .with_query("page", page)
                    .with_query("pageSize", page_size),
            )
            .ttl(PROJECTS_TTL)
    }

    /// Items of one tracker
    pub fn tracker_items(tracker_id: u64, max_items: u32) -> Self {
        Self::new(
            Endpoint::get(format!("/v3/trackers/{}/items", tracker_id)).with_query("pageSize", max_items),
        )
    }

    /// A single item by id
    pub fn item(item_id: u64) -> Self {
        Self::new(Endpoint::get(format!("/v3/items/{}", item_id)))
    }

    /// First page of items matching a query string
    pub fn query(query_string: impl Into<String>, max_results: u32) -> Self {
        Self::new(Endpoint::post(
            "/v3/items/query",
            json!({
                "queryString": query_string.into(),
                "page": 1,
                "pageSize": max_results,
            }),
        ))
    }

    /// Items matching a structured filter
    pub fn query_items(filter: &ItemFilter, max_results: u32) -> Self {
        Self::query(filter.to_query_string(), max_results)
    }

    /// Items whose name contains `label`
    pub fn search_by_name(label: &str, max_results: u32) -> Self {
        Self::query(format!("name LIKE '%{}%'", escape_text(label)), max_results)
    }
}
