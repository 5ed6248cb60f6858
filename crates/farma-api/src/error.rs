//! # API Error Types
//!
//! Everything that can go wrong between the terminal and the backend.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        API Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Transport     │  │   HTTP status   │  │     Payload             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Unreachable    │  │  NotFound (404) │  │  MalformedJson          │ │
//! │  │  Timeout        │  │  Http {status,  │  │  MissingField           │ │
//! │  │  Transport      │  │       message}  │  │                         │ │
//! │  │  InvalidUrl     │  │                 │  │                         │ │
//! │  │  InvalidId      │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Non-2xx responses carry the backend's `{error}` (or `{message}`) text
//! when it sent one, so the operator sees the most specific reason.

use thiserror::Error;

/// Result type alias for backend calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Shown when a failure carries nothing more specific.
pub const GENERIC_MESSAGE: &str = "The operation could not be completed";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Nothing is listening at the backend URL.
    #[error("Cannot reach backend at {0}")]
    Unreachable(String),

    /// The request exceeded the configured timeout.
    #[error("Connection to {0} timed out")]
    Timeout(String),

    /// The base URL or a path could not form a valid request URL.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// An id that cannot name a record in a URL path (empty, `.`, `..`).
    #[error("'{0}' is not a valid id")]
    InvalidId(String),

    /// Any other network failure.
    #[error("Network error: {0}")]
    Transport(String),

    // =========================================================================
    // Status Errors
    // =========================================================================
    /// 404 from the backend.
    #[error("{0}")]
    NotFound(String),

    /// Any other non-2xx status.
    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String },

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// A 2xx response whose body is not JSON.
    #[error("Invalid JSON from backend: {0}")]
    MalformedJson(String),

    /// A 2xx response that parsed but lacks a field the caller needs.
    #[error("Backend response is missing {0}")]
    MissingField(&'static str),
}

impl ApiError {
    /// Maps a reqwest failure to a transport error naming the URL.
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_connect() {
            return ApiError::Unreachable(url.to_string());
        }
        if err.is_timeout() {
            return ApiError::Timeout(url.to_string());
        }
        if err.is_builder() {
            return ApiError::InvalidUrl(url.to_string());
        }
        ApiError::Transport(err.to_string())
    }

    /// Builds the error for a non-2xx status. `message` is the backend's
    /// own text, if the body had one.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| status_message(status));
        if status == 404 {
            ApiError::NotFound(message)
        } else {
            ApiError::Http { status, message }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// True when the backend could not be contacted at all.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::Unreachable(_) | ApiError::Timeout(_) | ApiError::Transport(_)
        )
    }

    /// HTTP status, when the error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound(_) => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text for the operator banner: the backend's message when there is
    /// one, the transport description otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotFound(message) | ApiError::Http { message, .. } => message.clone(),
            ApiError::MalformedJson(_) | ApiError::MissingField(_) => GENERIC_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Fallback text per status class.
fn status_message(status: u16) -> String {
    match status {
        400 => "Invalid request".to_string(),
        401 => "Not logged in or invalid credentials".to_string(),
        403 => "Access denied".to_string(),
        404 => "Not found".to_string(),
        409 => "Record already exists".to_string(),
        s if s >= 500 => format!("Backend server error (HTTP {s})"),
        s => format!("Unexpected response from backend (HTTP {s})"),
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedJson(err.to_string())
    }
}
