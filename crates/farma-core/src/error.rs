//! # Error Types
//!
//! Domain-specific error types for farma-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  farma-core errors (this file)                                         │
//! │  ├── CoreError        - Cart and checkout rule violations              │
//! │  └── ValidationError  - Operator input failures                        │
//! │                                                                         │
//! │  farma-api errors (separate crate)                                     │
//! │  └── ApiError         - Transport, HTTP status, malformed JSON         │
//! │                                                                         │
//! │  pos-terminal errors (in app)                                          │
//! │  └── AppError         - What the operator sees in the banner           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          ApiError ──┴──► AppError → banner / inline    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is recoverable: the operator fixes the input and tries
//! again. None of them leaves the cart half-mutated.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Cart and checkout rule violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The product has no sellable unit in stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Search "ibuprofeno"
    ///      │
    ///      ▼
    /// Pick a result with existencia = 0
    ///      │
    ///      ▼
    /// OutOfStock { name: "Ibuprofeno 400mg" }
    ///      │
    ///      ▼
    /// Cart untouched, operator sees "Ibuprofeno 400mg is out of stock"
    /// ```
    #[error("{name} is out of stock")]
    OutOfStock { product_id: String, name: String },

    /// Checkout cannot start on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Submission needs a client from lookup, creation or the cart selector.
    #[error("No client selected for this sale")]
    NoClientSelected,

    /// The requested action is not valid in the current checkout step.
    #[error("Cannot {action} while checkout is in {step}")]
    InvalidTransition { step: String, action: String },

    /// Tendered amount does not cover the total.
    #[error("Tendered amount is short by {shortfall}")]
    NegativeChange { shortfall: Money },

    /// Card payments always tender exactly the total.
    #[error("Tendered amount is fixed to the total for card payments")]
    TenderLocked,

    /// One or more lines exceed the stock the backend last reported.
    #[error("{}", format_violations(.0))]
    StockExceeded(Vec<StockViolation>),

    /// The inline create-client form is only offered after a failed lookup.
    #[error("Client creation is only available after a lookup finds no match")]
    ClientCreationUnavailable,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// A cart line whose quantity is above its available stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockViolation {
    pub product_id: String,
    pub name: String,
    pub requested: i64,
    pub available: i64,
}

impl std::fmt::Display for StockViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: requested {}, only {} available",
            self.name, self.requested, self.available
        )
    }
}

fn format_violations(violations: &[StockViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Operator input validation errors.
///
/// Shown inline next to the field; they never navigate away or reset state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g. a document number with the wrong digit count).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
