//! # Till Reconciliation
//!
//! Pure math behind till closing: total a denomination count, work out the
//! expected drawer contents, and compare the two.
//!
//! ## Closing Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Manager counts the drawer                                              │
//! │    20 × $10.00, 7 × $5.00, 30 × $0.25  →  counted = $242.50            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  expected = opening float + cash sales + paid in - paid out            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  variance = counted - expected                                         │
//! │         │                                                               │
//! │         ├── |variance| ≤ alert threshold → session closes quietly      │
//! │         └── |variance| > alert threshold → session flagged for review  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Denomination Counts
// =============================================================================

/// One line of a drawer count: how many of one denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DenominationCount {
    /// Face value in cents (2000 for a $20 bill, 25 for a quarter).
    pub denomination_cents: i64,

    /// How many were counted. Zero lines are fine.
    pub quantity: i64,
}

/// Sums a drawer count.
pub fn count_total(counts: &[DenominationCount]) -> Money {
    let total = counts
        .iter()
        .map(|c| c.denomination_cents as i128 * c.quantity as i128)
        .sum::<i128>();
    Money::from_cents(total as i64)
}

/// Validates a drawer count before it is totalled and stored.
pub fn validate_denominations(counts: &[DenominationCount]) -> Result<(), ValidationError> {
    if counts.is_empty() {
        return Err(ValidationError::Required {
            field: "denominations".to_string(),
        });
    }
    if counts.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "denominations".to_string(),
            max: 50,
        });
    }
    for count in counts {
        if count.denomination_cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "denomination".to_string(),
            });
        }
        if count.quantity < 0 {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 0,
                max: 100_000,
            });
        }
        if count.quantity > 100_000 {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 0,
                max: 100_000,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Expectation & Reconciliation
// =============================================================================

/// The cash that should be in the drawer, by source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashExpectation {
    pub opening_float: Money,
    pub cash_sales: Money,
    pub paid_in: Money,
    pub paid_out: Money,
}

impl CashExpectation {
    /// opening float + cash sales + paid in - paid out.
    pub fn expected(&self) -> Money {
        self.opening_float + self.cash_sales + self.paid_in - self.paid_out
    }
}

/// Outcome of comparing a drawer count against expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub expected_cents: i64,
    pub counted_cents: i64,

    /// counted - expected. Negative means the drawer is short.
    pub variance_cents: i64,

    /// |variance| exceeded the store's alert threshold.
    pub over_threshold: bool,
}

/// Reconciles a drawer count against the session's expectation.
///
/// ## Example
/// ```rust
/// use backoffice_core::money::Money;
/// use backoffice_core::till::{reconcile, CashExpectation, DenominationCount};
///
/// let expectation = CashExpectation {
///     opening_float: Money::from_cents(20000),
///     cash_sales: Money::from_cents(4550),
///     paid_in: Money::from_cents(5000),
///     paid_out: Money::from_cents(2000),
/// };
/// let counts = [DenominationCount { denomination_cents: 2500, quantity: 11 }];
///
/// let r = reconcile(&expectation, &counts, Money::from_cents(500));
/// assert_eq!(r.expected_cents, 27550);
/// assert_eq!(r.counted_cents, 27500);
/// assert_eq!(r.variance_cents, -50);
/// assert!(!r.over_threshold);
/// ```
pub fn reconcile(
    expectation: &CashExpectation,
    counts: &[DenominationCount],
    alert_threshold: Money,
) -> Reconciliation {
    let expected = expectation.expected();
    let counted = count_total(counts);
    let variance = counted - expected;

    Reconciliation {
        expected_cents: expected.cents(),
        counted_cents: counted.cents(),
        variance_cents: variance.cents(),
        over_threshold: variance.abs() > alert_threshold,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
