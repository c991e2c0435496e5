//! # backoffice-core: Pure Business Logic for Backoffice
//!
//! Domain logic for the admin service, written as pure functions over plain
//! data. Anything that touches a socket, a file, or SQLite lives in the
//! neighbouring crates; this one only computes.
//!
//! ## Architecture Position
//! ```text
//! Admin frontend (web)
//!        │ HTTP JSON
//!        ▼
//! apps/admin-api (axum)    session check ──► permission check ──► handler
//!        │
//!        ▼
//! backoffice-core (THIS CRATE)    settings merge, money, BOM quotes,
//!        │                        till math, labels, numbering
//!        ▼
//! backoffice-db    SQLite pool, repositories, migrations
//! ```
//!
//! ## Modules
//!
//! - [`types`] - domain types (Product, ProductFamily, Customer, Register, ...)
//! - [`money`] - integer cent arithmetic and currency rendering
//! - [`settings`] - typed store settings: defaults, merge, render
//! - [`numbering`] - order/invoice/SKU number format parsing and preview
//! - [`bom`] - selling-unit price quotes and base-stock sufficiency
//! - [`till`] - till reconciliation math (denominations, variance)
//! - [`labels`] - shelf-label sheet layout and barcode check digits
//! - [`error`] - [`CoreError`] and [`ValidationError`]
//! - [`validation`] - request field validation
//!
//! ## Ground Rules
//!
//! - Deterministic functions; no database, network, or filesystem access
//! - Monetary values are i64 cents throughout ([`money::Money`])
//! - Fallible paths return typed errors, never strings and never panics
//!
//! ## Example Usage
//!
//! ```rust
//! use backoffice_core::money::Money;
//! use backoffice_core::bom::{BaseLot, PricingStrategy, quote};
//!
//! // A 24-pack of cola: costs $9.60, retails $14.40, 48 packs in stock
//! let base = BaseLot {
//!     cost: Money::from_cents(960),
//!     pack_quantity: 24,
//!     retail: Money::from_cents(1440),
//!     stock_on_hand: 1152,
//! };
//!
//! // Selling single cans, priced pro-rata from the pack retail price
//! let q = quote(&base, 1, &PricingStrategy::RetailProRata, 1000).unwrap();
//!
//! // $14.40 / 24 = $0.60 per can; unit cost is $0.40, so no floor needed
//! assert_eq!(q.price_cents, 60);
//! assert_eq!(q.sellable_units, 1152);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bom;
pub mod error;
pub mod labels;
pub mod money;
pub mod numbering;
pub mod settings;
pub mod till;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::{CurrencyFormat, Money};
pub use settings::StoreSettings;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of results a lookup endpoint may return.
///
/// ## Business Reason
/// Lookups back autocomplete boxes on admin pages. Returning more than a
/// page of candidates only slows the UI down, so requested limits are
/// clamped to this ceiling.
pub const MAX_SEARCH_LIMIT: i64 = 100;

/// Default number of results when a lookup omits the limit.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Maximum quantity of a single selling unit per stock check.
///
/// ## Business Reason
/// Catches fat-fingered quantities (1000 where 10 was meant) before they
/// turn into a quote for a pallet of six-packs.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum label copies for a single product in one sheet request.
///
/// ## Business Reason
/// A full pallet relabel is ~200 stickers. Anything above this is almost
/// certainly a typo and would produce a multi-hundred-page print job.
pub const MAX_LABEL_COPIES: i64 = 500;
