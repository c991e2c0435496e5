//! # Selling-Unit Pricing (BOM)
//!
//! A base product is bulk stock (a case, a sack, a roll). Selling units are
//! derived products that consume a slice of that stock per sale. This module
//! computes what a selling unit costs, what it should sell for, and how many
//! can still be sold from the base stock.
//!
//! ## The Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Base: 24-can case   cost $9.60   retail $14.40   stock 1152 cans      │
//! │  Unit: single can    unit_quantity = 1                                 │
//! │                                                                         │
//! │  Step 1: unit cost    = base cost × unit_qty / pack_qty                │
//! │                       = 960 × 1 / 24 = 40¢                             │
//! │                                                                         │
//! │  Step 2: strategy     = one of                                         │
//! │          cost_markup    unit cost × (1 + markup)                       │
//! │          retail_pro_rata base retail × unit_qty / pack_qty             │
//! │          fixed          explicit price                                 │
//! │                                                                         │
//! │  Step 3: margin floor = unit cost × (1 + minimum margin)               │
//! │          price        = max(strategy price, floor)                     │
//! │                                                                         │
//! │  Step 4: sellable     = stock ÷ unit_qty = 1152 cans                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The floor guarantees no derived unit is ever quoted below cost plus the
//! store's minimum margin, whatever strategy the admin picked.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::validate_quantity;

// =============================================================================
// Inputs
// =============================================================================

/// Cost, price and stock facts about a base product, as one pack.
///
/// `pack_quantity` is how many measure-units one pack contains; `cost` and
/// `retail` are per pack. `stock_on_hand` is tracked in measure-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseLot {
    /// Cost of one pack, in cents.
    pub cost: Money,
    /// Measure-units per pack. Must be positive.
    pub pack_quantity: i64,
    /// Retail price of one pack, in cents.
    pub retail: Money,
    /// Stock on hand, in measure-units. May be negative after oversells.
    pub stock_on_hand: i64,
}

/// How a selling unit's price is derived from its base product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingStrategy {
    /// Unit cost plus a markup, e.g. `markup_bps = 5000` is cost + 50%.
    CostMarkup { markup_bps: u32 },

    /// Base retail price scaled by unit_quantity / pack_quantity.
    ///
    /// A single can from a $14.40 24-pack prices at 60¢.
    RetailProRata,

    /// Explicit per-unit price set by the admin.
    Fixed { price_cents: i64 },
}

impl PricingStrategy {
    /// Reconstructs a strategy from its stored representation
    /// (kind string plus optional integer parameter).
    pub fn from_parts(kind: &str, param: Option<i64>) -> CoreResult<Self> {
        match kind {
            "cost_markup" => {
                let bps = param.ok_or_else(|| CoreError::InvalidStrategy {
                    reason: "cost_markup requires a markup parameter".to_string(),
                })?;
                let bps = u32::try_from(bps).map_err(|_| CoreError::InvalidStrategy {
                    reason: format!("markup {} out of range", bps),
                })?;
                Ok(PricingStrategy::CostMarkup { markup_bps: bps })
            }
            "retail_pro_rata" => Ok(PricingStrategy::RetailProRata),
            "fixed" => {
                let price = param.ok_or_else(|| CoreError::InvalidStrategy {
                    reason: "fixed requires a price parameter".to_string(),
                })?;
                if price < 0 {
                    return Err(CoreError::InvalidStrategy {
                        reason: format!("fixed price {} is negative", price),
                    });
                }
                Ok(PricingStrategy::Fixed { price_cents: price })
            }
            other => Err(CoreError::InvalidStrategy {
                reason: format!("unknown kind '{}'", other),
            }),
        }
    }

    /// The stored representation: kind string plus optional parameter.
    pub fn as_parts(&self) -> (&'static str, Option<i64>) {
        match self {
            PricingStrategy::CostMarkup { markup_bps } => {
                ("cost_markup", Some(*markup_bps as i64))
            }
            PricingStrategy::RetailProRata => ("retail_pro_rata", None),
            PricingStrategy::Fixed { price_cents } => ("fixed", Some(*price_cents)),
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// A computed price quote for one selling unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnitQuote {
    /// Prorated cost of one selling unit, in cents.
    pub unit_cost_cents: i64,

    /// What the link's strategy priced the unit at, before flooring.
    pub strategy_price_cents: i64,

    /// Final price: max(strategy price, cost + minimum margin).
    pub price_cents: i64,

    /// Margin of the final price over unit cost, in basis points.
    pub margin_bps: i64,

    /// True when the margin floor overrode the strategy price.
    pub floored: bool,

    /// Whole selling units coverable by current base stock.
    pub sellable_units: i64,
}

// =============================================================================
// Calculations
// =============================================================================

/// Prorated cost of one selling unit.
///
/// `unit cost = base cost × unit_quantity / pack_quantity`, rounded half up
/// in integer math with i128 intermediates.
///
/// ## Example
/// ```rust
/// use backoffice_core::bom::{unit_cost, BaseLot};
/// use backoffice_core::money::Money;
///
/// let base = BaseLot {
///     cost: Money::from_cents(960),
///     pack_quantity: 24,
///     retail: Money::from_cents(1440),
///     stock_on_hand: 240,
/// };
/// // 960 × 6 / 24 = 240
/// assert_eq!(unit_cost(&base, 6).unwrap().cents(), 240);
/// ```
pub fn unit_cost(base: &BaseLot, unit_quantity: i64) -> CoreResult<Money> {
    validate_unit_inputs(base.pack_quantity, unit_quantity)?;
    Ok(prorate(base.cost, unit_quantity, base.pack_quantity))
}

/// The unfloored price the link's strategy yields for one unit.
pub fn strategy_price(
    base: &BaseLot,
    unit_quantity: i64,
    strategy: &PricingStrategy,
) -> CoreResult<Money> {
    validate_unit_inputs(base.pack_quantity, unit_quantity)?;
    let price = match strategy {
        PricingStrategy::CostMarkup { markup_bps } => {
            prorate(base.cost, unit_quantity, base.pack_quantity).with_margin_bps(*markup_bps)
        }
        PricingStrategy::RetailProRata => {
            prorate(base.retail, unit_quantity, base.pack_quantity)
        }
        PricingStrategy::Fixed { price_cents } => Money::from_cents(*price_cents),
    };
    Ok(price)
}

/// Computes the full quote for one selling unit.
///
/// The final price is the strategy price, raised to
/// `unit cost × (1 + min_margin_bps)` when the strategy would undercut it.
///
/// ## Example
/// ```rust
/// use backoffice_core::bom::{quote, BaseLot, PricingStrategy};
/// use backoffice_core::money::Money;
///
/// let base = BaseLot {
///     cost: Money::from_cents(960),
///     pack_quantity: 24,
///     retail: Money::from_cents(1440),
///     stock_on_hand: 72,
/// };
///
/// // Admin fixed the can price at 42¢, but cost is 40¢ and the store
/// // requires 10% margin: the floor (44¢) wins.
/// let q = quote(&base, 1, &PricingStrategy::Fixed { price_cents: 42 }, 1000).unwrap();
/// assert_eq!(q.price_cents, 44);
/// assert!(q.floored);
/// assert_eq!(q.sellable_units, 72);
/// ```
pub fn quote(
    base: &BaseLot,
    unit_quantity: i64,
    strategy: &PricingStrategy,
    min_margin_bps: u32,
) -> CoreResult<UnitQuote> {
    let cost = unit_cost(base, unit_quantity)?;
    let strat = strategy_price(base, unit_quantity, strategy)?;

    let floor = cost.with_margin_bps(min_margin_bps);
    let price = if strat < floor { floor } else { strat };

    Ok(UnitQuote {
        unit_cost_cents: cost.cents(),
        strategy_price_cents: strat.cents(),
        price_cents: price.cents(),
        margin_bps: price.margin_bps_over(cost),
        floored: strat < floor,
        sellable_units: sellable_units(base.stock_on_hand, unit_quantity),
    })
}

/// Whole selling units current base stock can cover.
///
/// Integer division; negative stock reports zero sellable units.
pub fn sellable_units(stock_on_hand: i64, unit_quantity: i64) -> i64 {
    if unit_quantity <= 0 {
        return 0;
    }
    (stock_on_hand / unit_quantity).max(0)
}

/// Checks whether base stock covers a requested selling-unit quantity.
///
/// ## Errors
/// [`CoreError::InsufficientStock`] when `requested × unit_quantity` exceeds
/// `stock_on_hand`; `available` in the error is in selling units, matching
/// what the register asked about.
pub fn check_stock(
    sku: &str,
    stock_on_hand: i64,
    unit_quantity: i64,
    requested: i64,
) -> CoreResult<()> {
    validate_quantity(requested)?;
    if unit_quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_quantity".to_string(),
        }
        .into());
    }

    // i128 so a huge unit_quantity cannot overflow the product
    let required = requested as i128 * unit_quantity as i128;
    if required > stock_on_hand as i128 {
        return Err(CoreError::InsufficientStock {
            sku: sku.to_string(),
            available: sellable_units(stock_on_hand, unit_quantity),
            requested,
        });
    }

    Ok(())
}

// =============================================================================
// Internals
// =============================================================================

/// amount × numer / denom, rounded half up. Callers validate denom > 0.
fn prorate(amount: Money, numer: i64, denom: i64) -> Money {
    let num = amount.cents() as i128 * numer as i128;
    let den = denom as i128;
    Money::from_cents(((num + den / 2) / den) as i64)
}

fn validate_unit_inputs(pack_quantity: i64, unit_quantity: i64) -> CoreResult<()> {
    if pack_quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "pack_quantity".to_string(),
        }
        .into());
    }
    if unit_quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_quantity".to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
