//! # Domain Types
//!
//! Core domain types used throughout Backoffice.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  ProductFamily  │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  name (unique)  │   │  loyalty_card   │       │
//! │  │  price_cents    │   │  display_order  │   │  points_balance │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Register     │   │   TillSession   │   │     BomLink     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  Open / Closed  │   │  base ↔ unit    │       │
//! │  │  name           │   │  float, counts  │   │  unit_quantity  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, family name, loyalty card, etc.) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::bom::PricingStrategy;
use crate::money::Money;
use crate::till::DenominationCount;

// =============================================================================
// Product Family
// =============================================================================

/// A named grouping of products.
///
/// Families drive reporting rollups and shelf-label batches. A family with
/// active products cannot be deleted; the products must be reassigned first.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductFamily {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique among active families.
    pub name: String,

    /// Optional description shown on the admin page.
    pub description: Option<String>,

    /// Sort position in pickers and reports.
    pub display_order: i64,

    /// Whether family is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A family row joined with its active product count, for list pages.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FamilyWithCount {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[ts(flatten)]
    pub family: ProductFamily,

    /// Number of active products currently assigned.
    pub product_count: i64,
}

// =============================================================================
// Product
// =============================================================================

/// A product record as the admin pages see it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Display name shown on labels and lookups.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Family this product belongs to.
    pub family_id: Option<String>,

    /// Retail price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Cost in cents. Feeds margin floors for derived selling units.
    pub cost_cents: i64,

    /// Measure-units contained in one pack of this product.
    ///
    /// 1 for ordinary items. A 24-can case has pack_quantity 24; selling
    /// units derived from it consume that stock can by can.
    pub pack_quantity: i64,

    /// Current stock level, in measure-units.
    pub stock_on_hand: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the retail price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the cost as a Money type.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

// =============================================================================
// Customer & Loyalty
// =============================================================================

/// A customer record, as surfaced by admin lookups.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,

    /// Loyalty card number, unique when present.
    pub loyalty_card: Option<String>,

    /// Current loyalty point balance (denormalized from the ledger).
    pub points_balance: i64,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Direction of a loyalty ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyKind {
    /// Points earned on a sale.
    Earn,
    /// Points spent against a purchase.
    Redeem,
    /// Manual correction by an admin.
    Adjust,
}

/// One loyalty ledger entry. `points` is a signed delta; the customer's
/// balance is the sum of their entries.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LoyaltyEntry {
    pub id: String,
    pub customer_id: String,
    pub kind: LoyaltyKind,
    pub points: i64,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Register & Till
// =============================================================================

/// A physical checkout register.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Register {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of a till session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TillStatus {
    /// Session is open and accepting cash movements.
    Open,
    /// Session was counted and closed; figures are frozen.
    Closed,
}

impl Default for TillStatus {
    fn default() -> Self {
        TillStatus::Open
    }
}

/// Kind of cash movement recorded against an open till session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Cash taken for a sale (posted by the register).
    CashSale,
    /// Cash added to the drawer (change top-up, float increase).
    PaidIn,
    /// Cash removed from the drawer (supplier payout, bank drop).
    PaidOut,
}

/// One cash movement against a till session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TillMovement {
    pub id: String,
    pub session_id: String,
    pub kind: MovementKind,
    pub amount_cents: i64,
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One register's cash drawer period, from float-in to count-and-close.
///
/// ## Lifecycle
/// ```text
/// open (float $200.00)
///      │
///      ├── cash_sale  +$45.50     (register posts these)
///      ├── paid_out   -$20.00     "window cleaner"
///      ├── paid_in    +$50.00     "change from safe"
///      │
///      ▼
/// close (counted $275.00)
///      │
///      ▼
/// expected = 200 + 45.50 + 50 - 20 = $275.50
/// variance = counted - expected   = -$0.50
/// ```
///
/// The count, expected and variance columns stay NULL until close; after
/// close the row is frozen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TillSession {
    pub id: String,
    pub register_id: String,
    pub status: TillStatus,

    /// User who opened the session.
    pub opened_by: String,

    /// Cash placed in the drawer at open, in cents.
    pub opening_float_cents: i64,

    /// User who closed the session (None while open).
    pub closed_by: Option<String>,

    /// Denomination-by-denomination count entered at close.
    pub denominations: Option<Vec<DenominationCount>>,

    /// Total counted at close, in cents.
    pub counted_cents: Option<i64>,

    /// Expected drawer total at close, in cents.
    pub expected_cents: Option<i64>,

    /// counted - expected, in cents. Negative means the drawer is short.
    pub variance_cents: Option<i64>,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// BOM Link
// =============================================================================

/// Links a base product (bulk stock) to a derived selling unit.
///
/// The selling unit consumes `unit_quantity` measure-units of the base
/// product per sale, and its price comes from the link's strategy plus the
/// store-wide margin floor.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BomLink {
    pub id: String,

    /// Product whose stock and cost back this unit.
    pub base_product_id: String,

    /// Product sold at the register.
    pub unit_product_id: String,

    /// Measure-units of base stock consumed per unit sold.
    pub unit_quantity: i64,

    /// How the selling price is derived.
    pub strategy: PricingStrategy,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Users, Roles & Permissions
// =============================================================================

/// Admin account role.
///
/// Roles are coarse; the route layer checks the fine-grained
/// [`Permission`] each role grants. Stored lowercase in the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including user administration.
    Admin,
    /// Day-to-day store management; cannot administer users.
    Manager,
    /// Lookups and label printing only.
    Clerk,
}

/// Fine-grained capability required by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageSettings,
    ManageProducts,
    ManageFamilies,
    ManageBom,
    ManageUsers,
    PrintLabels,
    ViewLookups,
    CloseTill,
}

impl Role {
    /// Permissions granted to this role.
    ///
    /// ## Grant Table
    /// ```text
    /// ┌──────────────────┬───────┬─────────┬───────┐
    /// │ Permission       │ Admin │ Manager │ Clerk │
    /// ├──────────────────┼───────┼─────────┼───────┤
    /// │ ManageSettings   │   ✓   │    ✓    │       │
    /// │ ManageProducts   │   ✓   │    ✓    │       │
    /// │ ManageFamilies   │   ✓   │    ✓    │       │
    /// │ ManageBom        │   ✓   │    ✓    │       │
    /// │ ManageUsers      │   ✓   │         │       │
    /// │ PrintLabels      │   ✓   │    ✓    │   ✓   │
    /// │ ViewLookups      │   ✓   │    ✓    │   ✓   │
    /// │ CloseTill        │   ✓   │    ✓    │       │
    /// └──────────────────┴───────┴─────────┴───────┘
    /// ```
    pub const fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => &[
                Permission::ManageSettings,
                Permission::ManageProducts,
                Permission::ManageFamilies,
                Permission::ManageBom,
                Permission::ManageUsers,
                Permission::PrintLabels,
                Permission::ViewLookups,
                Permission::CloseTill,
            ],
            Role::Manager => &[
                Permission::ManageSettings,
                Permission::ManageProducts,
                Permission::ManageFamilies,
                Permission::ManageBom,
                Permission::PrintLabels,
                Permission::ViewLookups,
                Permission::CloseTill,
            ],
            Role::Clerk => &[Permission::PrintLabels, Permission::ViewLookups],
        }
    }

    /// Checks whether this role grants a permission.
    pub fn can(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// An admin account, as exposed over the API.
///
/// The password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
