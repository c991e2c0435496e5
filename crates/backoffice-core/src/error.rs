//! # Error Types
//!
//! Domain-specific error types for backoffice-core.
//!
//! ## How errors travel
//! ```text
//! ValidationError ──► CoreError ──┐
//!                                 ├──► ApiError (admin-api, one JSON shape)
//! DbError (backoffice-db) ────────┘
//! ```
//!
//! Everything derives `thiserror::Error`. Messages carry the identifying
//! context (sku, session id, field name); the admin frontend shows them
//! verbatim.

use thiserror::Error;

// =============================================================================
// Domain Errors
// =============================================================================

/// Business rule failures raised by the domain modules.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A product id or SKU that no active row answers to.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Base stock cannot cover a selling-unit quantity.
    ///
    /// `available` is in selling units: a request for 5 six-packs against
    /// 20 loose cans reports `available: 3, requested: 5`.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Family delete blocked while products are still assigned.
    ///
    /// The admin has to reassign or deactivate those products first.
    #[error("Family '{name}' still has {active_products} active products")]
    FamilyNotEmpty { name: String, active_products: i64 },

    /// Operation against a till session that is no longer open.
    ///
    /// Raised when closing an already-closed session or recording a cash
    /// movement against one.
    #[error("Till session {session_id} is already closed")]
    SessionClosed { session_id: String },

    /// Second open attempt on a register whose session never closed.
    #[error("Register {register_id} already has an open till session")]
    SessionAlreadyOpen { register_id: String },

    /// Stored pricing strategy has an unknown kind or a missing parameter.
    #[error("Invalid pricing strategy: {reason}")]
    InvalidStrategy { reason: String },

    /// Wrapper for input validation failures.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Convenience alias for domain results.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Validation Errors
// =============================================================================

/// Input validation failures, raised before any business logic runs.
///
/// Constructed by `crate::validation` and by handlers doing field checks of
/// their own.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Empty or missing required field.
    #[error("{field} is required")]
    Required { field: String },

    /// Under the minimum length.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Over the maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Outside the permitted numeric range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Zero or negative where only positive values make sense.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Failed a format rule (charset, UUID, number pattern).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Unit Tests
// =============================================================================
