//! # Validation Module
//!
//! Request payload validation for the admin API.
//!
//! ## Where checks run
//! ```text
//! JSON body ──► serde (shape, types) ──► validate_* (rules) ──► repository
//! ```
//!
//! Handlers call these before touching a repository, so bad input comes back
//! as a field-level validation error instead of surfacing as a SQLite
//! constraint failure. The schema still enforces its own NOT NULL, UNIQUE,
//! and CHECK constraints underneath.
//!
//! String validators trim before checking. Range limits reuse the constants
//! from the crate root (`MAX_ITEM_QUANTITY`, `MAX_SEARCH_LIMIT`, ...).

use crate::error::ValidationError;
use crate::{DEFAULT_SEARCH_LIMIT, MAX_ITEM_QUANTITY, MAX_LABEL_COPIES, MAX_SEARCH_LIMIT};

/// Shorthand for validation outcomes.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Text Fields
// =============================================================================

/// Validates a SKU (stock keeping unit).
///
/// ## Rules
/// - Non-empty after trimming
/// - At most 50 characters
/// - Letters, digits, hyphens, and underscores
///
/// ## Example
/// ```rust
/// use backoffice_core::validation::validate_sku;
///
/// assert!(validate_sku("COLA-CAN").is_ok());
/// assert!(validate_sku("no spaces").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }
    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    check_charset("sku", sku, "-_", "letters, numbers, hyphens, and underscores")
}

/// Validates a product name. Non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 200)
}

/// Validates a family name.
///
/// Same shape as product names but shorter: family names appear in picker
/// dropdowns and label footers.
pub fn validate_family_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 100)
}

/// Validates a search query and returns it trimmed.
///
/// An empty query is legal: lookup endpoints answer it with their default
/// listing. Only the length is capped.
pub fn validate_search_query(raw: &str) -> ValidationResult<String> {
    let query = raw.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an admin account username.
///
/// ## Rules
/// - 3 to 50 characters
/// - Letters, digits, dots, hyphens, and underscores
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if username.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }

    check_charset(
        "username",
        username,
        ".-_",
        "letters, numbers, dots, hyphens, and underscores",
    )
}

/// Validates a new password before it is hashed.
///
/// 8 to 128 characters. Composition rules are the frontend's concern.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.len() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }
    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Trims, then enforces non-empty and a length cap.
fn validate_name(field: &str, name: &str, max: usize) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if name.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Alphanumerics plus the characters listed in `extra`.
fn check_charset(field: &str, value: &str, extra: &str, allowed: &str) -> ValidationResult<()> {
    if value.chars().all(|c| c.is_alphanumeric() || extra.contains(c)) {
        return Ok(());
    }

    Err(ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("must contain only {}", allowed),
    })
}

// =============================================================================
// Numeric Fields
// =============================================================================

/// Validates a unit quantity (BOM unit counts, quote requests).
///
/// ## Rules
/// - Positive
/// - At most MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// Zero is legal (giveaway items); negative prices are not.
///
/// ## Example
/// ```rust
/// use backoffice_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(249).is_ok());
/// assert!(validate_price_cents(-1).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates the copy count for one label request.
///
/// Zero copies is allowed and just skips the product. The cap is
/// MAX_LABEL_COPIES (500) per line.
pub fn validate_label_copies(copies: i64) -> ValidationResult<()> {
    if copies < 0 || copies > MAX_LABEL_COPIES {
        return Err(ValidationError::OutOfRange {
            field: "copies".to_string(),
            min: 0,
            max: MAX_LABEL_COPIES,
        });
    }

    Ok(())
}

/// Clamps a requested lookup limit into 1..=MAX_SEARCH_LIMIT.
///
/// A missing limit gets the default page size; out-of-range limits are
/// clamped rather than rejected.
pub fn clamp_search_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT)
}

// =============================================================================
// Identifiers
// =============================================================================

/// Validates that a string parses as a UUID.
///
/// Primary keys across the schema are uuid v4 strings; run this on
/// externally supplied ids.
///
/// ## Example
/// ```rust
/// use backoffice_core::validation::validate_uuid;
///
/// assert!(validate_uuid("0f8fad5b-d9cb-469f-a165-70867728950e").is_ok());
/// assert!(validate_uuid("123").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    match uuid::Uuid::parse_str(id) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: "must be a valid UUID".to_string(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COLA-CAN").is_ok());
        assert!(validate_sku("pack_24").is_ok());
        assert!(validate_sku(" A1 ").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("no spaces").is_err());
        assert!(validate_sku(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_names() {
        assert!(validate_product_name("Cola 330ml Can").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"n".repeat(201)).is_err());

        assert!(validate_family_name("Beverages").is_ok());
        assert!(validate_family_name("  ").is_err());
        assert!(validate_family_name(&"f".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  cola  ").unwrap(), "cola");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jane.doe").is_ok());
        assert!(validate_username("jd").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"u".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct-horse").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(249).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_label_copies() {
        assert!(validate_label_copies(0).is_ok());
        assert!(validate_label_copies(MAX_LABEL_COPIES).is_ok());
        assert!(validate_label_copies(MAX_LABEL_COPIES + 1).is_err());
        assert!(validate_label_copies(-1).is_err());
    }

    #[test]
    fn test_clamp_search_limit() {
        assert_eq!(clamp_search_limit(None), DEFAULT_SEARCH_LIMIT);
        assert_eq!(clamp_search_limit(Some(50)), 50);
        assert_eq!(clamp_search_limit(Some(0)), 1);
        assert_eq!(clamp_search_limit(Some(-3)), 1);
        assert_eq!(clamp_search_limit(Some(5000)), MAX_SEARCH_LIMIT);
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("0f8fad5b-d9cb-469f-a165-70867728950e").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("0f8fad5b").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
