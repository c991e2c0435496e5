//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, and the
//! `CurrencyFormat` used to render amounts with the store's currency settings.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Floats drift: 0.1 + 0.2 = 0.30000000000000004                          │
//! │                                                                         │
//! │  A till variance or a margin floor computed on floats will eventually   │
//! │  be off by a cent, and a cent is exactly what reconciliation reports.  │
//! │                                                                         │
//! │  So: every amount is an i64 count of cents. Division still truncates    │
//! │  ($14.50 / 24 = 60 cents/can, 10 cents left in the case), but the      │
//! │  remainder is visible and testable instead of smeared across floats.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use backoffice_core::money::Money;
//!
//! let can = Money::from_cents(60);
//! let six_pack: Money = can * 6;               // $3.60
//! let with_case = six_pack + Money::from_cents(25); // $3.85
//! assert_eq!(with_case.cents(), 385);
//! ```
//!
//! There is deliberately no constructor from `f64`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for payouts, till variances
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price_cents ──► label price text ──► printed shelf label      │
/// │                                                                         │
/// │  BaseLot.cost ──► unit cost ──► margin floor ──► selling-unit price    │
/// │                                                                         │
/// │  Opening float + cash sales - payouts ──► expected cash ──► variance   │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use backoffice_core::money::Money;
    ///
    /// let price = Money::from_cents(249); // $2.49
    /// assert_eq!(price.cents(), 249);
    /// ```
    ///
    /// ## Why Cents?
    /// Storing the smallest unit keeps floats out of the system entirely.
    /// The database, the pricing math, and the API all speak cents; only
    /// rendering converts to major units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use backoffice_core::money::Money;
    ///
    /// let price = Money::from_major_minor(14, 40); // $14.40
    /// assert_eq!(price.cents(), 1440);
    ///
    /// let payout = Money::from_major_minor(-2, 75); // -$2.75
    /// assert_eq!(payout.cents(), -275);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit carries the sign:
    /// `from_major_minor(-2, 75)` is -$2.75, not -$1.25.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        // minor moves away from zero in the direction of major
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    ///
    /// ## Example
    /// ```rust
    /// use backoffice_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1437).dollars(), 14);
    /// assert_eq!(Money::from_cents(-275).dollars(), -2);
    /// ```
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a basis-point fraction of this amount, rounding half up.
    ///
    /// ## Basis Points
    /// 1 basis point = 0.01% = 1/10000. 2500 bps = 25%.
    ///
    /// ## Implementation
    /// We use integer math: `(amount * bps + 5000) / 10000`
    /// The +5000 provides rounding (5000/10000 = 0.5). i128 intermediates
    /// prevent overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use backoffice_core::money::Money;
    ///
    /// let cost = Money::from_cents(1000);          // $10.00
    /// let markup = cost.apply_bps(2550);           // 25.5%
    /// // $10.00 × 25.5% = $2.55
    /// assert_eq!(markup.cents(), 255);
    /// ```
    pub fn apply_bps(&self, bps: u32) -> Money {
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(part as i64)
    }

    /// Returns this amount grown by a basis-point margin.
    ///
    /// ## Example
    /// ```rust
    /// use backoffice_core::money::Money;
    ///
    /// let unit_cost = Money::from_cents(400);      // $4.00
    /// let floor = unit_cost.with_margin_bps(1500); // +15%
    /// assert_eq!(floor.cents(), 460);              // $4.60
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Unit cost: $4.00
    ///      │
    ///      ▼
    /// with_margin_bps(1500) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Price floor: $4.60
    ///      │
    ///      ▼
    /// price = max(strategy price, $4.60)
    /// ```
    pub fn with_margin_bps(&self, bps: u32) -> Money {
        *self + self.apply_bps(bps)
    }

    /// Returns the margin of this amount over a cost, in basis points.
    ///
    /// Negative when this amount is below cost. Returns 0 when the cost is
    /// zero or negative (margin is undefined there).
    ///
    /// ## Example
    /// ```rust
    /// use backoffice_core::money::Money;
    ///
    /// let price = Money::from_cents(600);
    /// let cost = Money::from_cents(400);
    /// // ($6.00 - $4.00) / $4.00 = 50% = 5000 bps
    /// assert_eq!(price.margin_bps_over(cost), 5000);
    /// ```
    pub fn margin_bps_over(&self, cost: Money) -> i64 {
        if cost.0 <= 0 {
            return 0;
        }
        let diff = self.0 as i128 - cost.0 as i128;
        ((diff * 10000) / cost.0 as i128) as i64
    }

}

// =============================================================================
// Currency Format
// =============================================================================

/// The store's configured currency presentation.
///
/// Loaded from the settings table; used wherever an amount is rendered as
/// text (shelf labels, loyalty balances, till summaries).
///
/// ## Why Not Locale Libraries?
/// Admin output needs exactly what the merchant configured (symbol, decimal
/// count, symbol side). No grouping separators, no locale negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrencyFormat {
    /// Currency code (ISO 4217), e.g. "USD".
    pub code: String,

    /// Display symbol, e.g. "$".
    pub symbol: String,

    /// Number of decimal places (0 for JPY-style currencies).
    pub decimals: u8,

    /// Render the symbol after the amount ("9.99 kr") instead of before.
    pub symbol_after: bool,
}

impl CurrencyFormat {
    /// Formats a Money amount using this currency's settings.
    ///
    /// ## Example
    /// ```rust
    /// use backoffice_core::money::{CurrencyFormat, Money};
    ///
    /// let usd = CurrencyFormat::default();
    /// assert_eq!(usd.format(Money::from_cents(1234)), "$12.34");
    /// assert_eq!(usd.format(Money::from_cents(-550)), "-$5.50");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let divisor = 10_i64.pow(self.decimals as u32);
        let cents = amount.cents();
        let whole = (cents / divisor).abs();
        let frac = (cents % divisor).abs();

        let number = if self.decimals > 0 {
            format!("{}.{:0width$}", whole, frac, width = self.decimals as usize)
        } else {
            whole.to_string()
        };

        let sign = if cents < 0 { "-" } else { "" };
        if self.symbol_after {
            format!("{}{} {}", sign, number, self.symbol)
        } else {
            format!("{}{}{}", sign, self.symbol, number)
        }
    }
}

impl Default for CurrencyFormat {
    /// US dollar presentation, matching the default settings rows.
    fn default() -> Self {
        CurrencyFormat {
            code: "USD".to_string(),
            symbol: "$".to_string(),
            decimals: 2,
            symbol_after: false,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging. Use [`CurrencyFormat::format`] for anything the
/// merchant sees, so the configured symbol and decimals are honored.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
