//! # Validation Module
//!
//! Operator input checks that run before anything reaches the backend.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal input                                               │
//! │  └── Parsing the command line into typed arguments                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Document number shape (7-8 digits)                                │
//! │  ├── Required client name                                              │
//! │  └── Amount parsing (',' or '.')                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  ├── 400 on missing fields                                             │
//! │  └── 409 on duplicate CI                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::{parse_amount, Money};
use crate::role::Role;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Document numbers shorter than this never trigger a lookup.
pub const DOCUMENT_MIN_DIGITS: usize = 7;
pub const DOCUMENT_MAX_DIGITS: usize = 8;

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_SEARCH_LENGTH: usize = 100;

// =============================================================================
// Clients
// =============================================================================

/// Strips everything but ASCII digits.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// True once the typed document has enough digits to look up.
pub fn is_lookup_ready(input: &str) -> bool {
    let len = digits_only(input).len();
    (DOCUMENT_MIN_DIGITS..=DOCUMENT_MAX_DIGITS).contains(&len)
}

/// Validates a client document number (CI).
///
/// Non-digits are dropped first, so `"1.234.567"` is accepted as
/// `"1234567"`.
///
/// ## Example
/// ```rust
/// use farma_core::validation::validate_document_number;
///
/// assert_eq!(validate_document_number("1.234.567").unwrap(), "1234567");
/// assert!(validate_document_number("12345").is_err());
/// ```
pub fn validate_document_number(input: &str) -> ValidationResult<String> {
    let digits = digits_only(input);

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "document number".to_string(),
        });
    }

    if !(DOCUMENT_MIN_DIGITS..=DOCUMENT_MAX_DIGITS).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "document number".to_string(),
            reason: format!(
                "must have {} or {} digits",
                DOCUMENT_MIN_DIGITS, DOCUMENT_MAX_DIGITS
            ),
        });
    }

    Ok(digits)
}

/// Validates the name (or business name) of a client being created.
pub fn validate_client_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

// =============================================================================
// Users
// =============================================================================

/// Validates the display name of a back-office user. Digits are refused.
pub fn validate_user_name(name: &str) -> ValidationResult<String> {
    let name = validate_client_name(name)?;

    if name.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "must not contain digits".to_string(),
        });
    }

    Ok(name)
}

/// Only the two roles the backend knows may be assigned.
pub fn validate_user_role(input: &str) -> ValidationResult<Role> {
    match Role::from_name(input) {
        Role::Unknown => Err(ValidationError::Required {
            field: "role".to_string(),
        }),
        role @ (Role::Admin | Role::Vendedor) => Ok(role),
        Role::Other(name) => Err(ValidationError::InvalidFormat {
            field: "role".to_string(),
            reason: format!("'{name}' is not one of admin, vendedor"),
        }),
    }
}

// =============================================================================
// Products
// =============================================================================

/// Validates a search term. Empty is allowed and lists everything.
pub fn validate_search_term(term: &str) -> ValidationResult<String> {
    let term = term.trim();

    if term.chars().count() > MAX_SEARCH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LENGTH,
        });
    }

    Ok(term.to_string())
}

/// Validates a product code used for lookups and creation.
pub fn validate_product_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(code.to_string())
}

// =============================================================================
// Amounts
// =============================================================================

/// Parses a non-negative amount typed by the operator.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Payment: Cash                                                          │
/// │                                                                         │
/// │  Operator types tendered: "20,50"                                      │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_amount("tendered", "20,50") ← THIS FUNCTION                  │
/// │       │                                                                 │
/// │       ├── not a number? → "tendered has invalid format"                │
/// │       ├── below zero?   → "tendered cannot be negative"                │
/// │       └── OK → Money(2050), change recomputed                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_amount(field: &str, input: &str) -> ValidationResult<Money> {
    if input.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let amount = parse_amount(input).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected an amount like 12.50".to_string(),
    })?;

    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_number_strips_non_digits() {
        assert_eq!(validate_document_number("1.234.567").unwrap(), "1234567");
        assert_eq!(validate_document_number(" 12345678 ").unwrap(), "12345678");
    }

    #[test]
    fn test_document_number_length() {
        assert!(matches!(
            validate_document_number(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_document_number("123456"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(validate_document_number("123456789").is_err());
    }

    #[test]
    fn test_lookup_ready() {
        assert!(!is_lookup_ready("123456"));
        assert!(is_lookup_ready("1234567"));
        assert!(is_lookup_ready("12-345-678"));
        assert!(!is_lookup_ready("123456789"));
    }

    #[test]
    fn test_client_name_required() {
        assert_eq!(validate_client_name("  Farmacia Sol ").unwrap(), "Farmacia Sol");
        assert_eq!(
            validate_client_name("   ").unwrap_err().to_string(),
            "name is required"
        );
        assert!(validate_client_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_user_name_refuses_digits() {
        assert_eq!(validate_user_name("  Ana Mamani ").unwrap(), "Ana Mamani");
        assert!(matches!(
            validate_user_name("Ana2"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_user_name(" "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_user_role() {
        assert_eq!(validate_user_role("Admin").unwrap(), Role::Admin);
        assert_eq!(validate_user_role("vendedor").unwrap(), Role::Vendedor);
        assert!(validate_user_role("cajero").is_err());
        assert!(validate_user_role("").is_err());
    }

    #[test]
    fn test_search_term() {
        assert_eq!(validate_search_term("  amox ").unwrap(), "amox");
        assert_eq!(validate_search_term("").unwrap(), "");
        assert!(validate_search_term(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_product_code() {
        assert_eq!(validate_product_code(" 7790001 ").unwrap(), "7790001");
        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("77 90").is_err());
    }

    #[test]
    fn test_amount() {
        assert_eq!(validate_amount("tendered", "20,50").unwrap().cents(), 2050);
        assert!(matches!(
            validate_amount("tendered", "-1"),
            Err(ValidationError::Negative { .. })
        ));
        assert!(matches!(
            validate_amount("tendered", "veinte"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_amount("tendered", " "),
            Err(ValidationError::Required { .. })
        ));
    }
}
