//! Error handling for the Aqarak client

use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Generic message shown when a failure carries no server-provided detail
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Unified error type for the Aqarak client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Session persistence errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server rejected the credentials or the bearer token (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success response from the API
    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// Input rejected before a request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication state errors, such as acting without a session
    #[error("Authentication error: {0}")]
    Auth(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Build an error from a failed response body.
    ///
    /// FastAPI style bodies carry `detail` either as a string or as a list of
    /// `{ "msg": .. }` objects; both are flattened into one message. Bodies
    /// without a detail fall back to the raw text, then to the status reason.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = extract_detail(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                trimmed.to_string()
            }
        });

        if status == StatusCode::UNAUTHORIZED {
            Error::Unauthorized(detail)
        } else {
            Error::Api {
                status: status.as_u16(),
                detail,
            }
        }
    }

    /// HTTP status of the failure, when there was a response at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized(_) => Some(401),
            Error::Api { status, .. } => Some(*status),
            Error::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this error ended (or would end) the current session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }

    /// Message suitable for showing to an end user.
    ///
    /// Client errors and validation failures are shown verbatim; everything
    /// else collapses into a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthorized(detail) => detail.clone(),
            Error::Api { status, detail } if (400..500).contains(status) => detail.clone(),
            Error::Validation(msg) | Error::Auth(msg) => msg.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("msg").and_then(Value::as_str).map(str::to_string),
                })
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
