//! # Terminal Error Type
//!
//! Unified error type for terminal commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Command ──► Result<T, AppError>                                        │
//! │                 │                                                       │
//! │                 ├── CoreError (cart, checkout) ───► BusinessLogic /     │
//! │                 │                                   InsufficientStock   │
//! │                 ├── ValidationError ──────────────► ValidationError     │
//! │                 ├── ApiError (backend) ───────────► NotFound /          │
//! │                 │                                   BackendError /      │
//! │                 │                                   Unreachable         │
//! │                 └── io::Error (receipt files) ────► Internal            │
//! │                                                                         │
//! │  The REPL prints `message` as a dismissible banner and keeps going.     │
//! │  Nothing here ends the process.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use farma_api::ApiError;
use farma_core::{CoreError, ValidationError};
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

/// Error returned from terminal commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    /// Machine-readable code
    pub code: ErrorCode,

    /// Operator-facing text
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Operator input rejected before reaching the backend
    ValidationError,

    /// Cart or checkout rule broken
    BusinessLogic,

    /// A line asks for more units than are in stock
    InsufficientStock,

    /// Backend answered with an error status
    BackendError,

    /// Backend could not be reached
    Unreachable,

    /// Route or command needs a role the session lacks
    Forbidden,

    /// Command needs a logged-in session
    SessionRequired,

    /// Unknown or malformed command line
    UnknownCommand,

    /// Local failure (receipt files, browser)
    Internal,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    pub fn business(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::BusinessLogic, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Forbidden, message)
    }

    pub fn session_required() -> Self {
        AppError::new(
            ErrorCode::SessionRequired,
            "Log in first (login <user> <password>)",
        )
    }

    pub fn unknown_command(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::UnknownCommand, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }

    /// Validation problems are shown inline and never move the operator.
    pub fn is_recoverable_inline(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ValidationError | ErrorCode::InsufficientStock | ErrorCode::BusinessLogic
        )
    }
}

/// Converts backend errors, keeping the backend's own message.
impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        let message = err.user_message();
        match err {
            ApiError::NotFound(_) => AppError::not_found(message),
            ApiError::Unreachable(_) | ApiError::Timeout(_) | ApiError::Transport(_) => {
                AppError::new(ErrorCode::Unreachable, message)
            }
            ApiError::Http { status: 401, .. } => AppError::new(ErrorCode::SessionRequired, message),
            ApiError::Http { status: 403, .. } => AppError::forbidden(message),
            ApiError::Http { status: 400, .. } => AppError::validation(message),
            ApiError::InvalidId(_) => AppError::validation(message),
            ApiError::InvalidUrl(_) => AppError::internal(message),
            ApiError::MalformedJson(ref detail) => {
                tracing::error!(detail = %detail, "Backend sent malformed JSON");
                AppError::new(ErrorCode::BackendError, message)
            }
            ApiError::Http { .. } | ApiError::MissingField(_) => {
                AppError::new(ErrorCode::BackendError, message)
            }
        }
    }
}

/// Converts core errors to terminal errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OutOfStock { .. } | CoreError::StockExceeded(_) => {
                AppError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::Validation(e) => AppError::from(e),
            other => AppError::business(other.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("Local I/O failed: {}", err);
        AppError::internal(format!("Could not write file: {err}"))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
