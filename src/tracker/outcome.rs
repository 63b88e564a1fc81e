//! Classified results of tracker requests
//!
//! Operational failures are data, not errors: every dispatched request ends
//! in exactly one `RequestOutcome` variant.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error as StdError;

/// Result of a dispatched request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum RequestOutcome {
    /// The tracker answered 200 or 201; the body decoded as JSON
    Success(Value),
    /// The tracker answered with any other status
    ApiError {
        status: u16,
        message: String,
        body: String,
    },
    /// The request never produced an HTTP response
    TransportError { message: String },
}

impl RequestOutcome {
    /// Classifies an HTTP status and body
    ///
    /// 200 and 201 are successes. The body is decoded leniently: an empty body
    /// becomes `null` and an undecodable body becomes an empty object.
    pub fn from_response(status: StatusCode, body: String) -> Self {
        if status == StatusCode::OK || status == StatusCode::CREATED {
            return Self::Success(decode_payload(&body));
        }

        Self::ApiError {
            status: status.as_u16(),
            message: format!("API request failed: {}", status.as_u16()),
            body,
        }
    }

    /// Classifies a failure that happened before a response was read
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let detail = error_chain(err);
        // The top-level message carries the URL; only the causes say what failed
        let cause = err.source().map(error_chain).unwrap_or_default();
        let message = if err.is_timeout() {
            format!("Request timed out: {}", detail)
        } else if is_tls_failure(&cause) {
            format!("SSL verification failed: {}", detail)
        } else {
            format!("Network error: {}", detail)
        };

        Self::TransportError { message }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_api_error(&self) -> bool {
        matches!(self, Self::ApiError { .. })
    }

    /// HTTP status of an `ApiError`
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable failure description, `None` on success
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::ApiError { message, .. } | Self::TransportError { message } => {
                Some(message.as_str())
            }
        }
    }
}

fn decode_payload(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Joins an error and its sources; reqwest hides the root cause in `source()`
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_tls_failure(detail: &str) -> bool {
    let detail = detail.to_ascii_lowercase();
    ["certificate", "tls", "handshake", "ssl"]
        .iter()
        .any(|needle| detail.contains(needle))
}
