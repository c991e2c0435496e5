//! # Store Settings
//!
//! Every tenant-configurable business parameter lives in one key-value
//! settings table. This module owns the typed view of that table.
//!
//! ## Merge Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Settings Resolution                                  │
//! │                                                                         │
//! │  Compiled-in defaults (StoreSettings::default)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DB rows override, key by key        "currency.symbol" = "€"           │
//! │       │                                                                 │
//! │       ├── unknown key?      → ignored here, preserved in the table     │
//! │       ├── unparsable value? → default kept for that key                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Complete StoreSettings, ALWAYS                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The merge is total on purpose: a half-migrated or hand-edited settings
//! table must never stop the admin pages from loading.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::CurrencyFormat;
use crate::numbering::NumberFormat;

// =============================================================================
// Setting Keys
// =============================================================================

/// Every setting key this service understands.
///
/// Keys are dotted strings in the table (`"currency.symbol"`). Unknown keys
/// may exist alongside these (written by other tools) and round-trip
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    StoreName,
    StoreAddress,
    StorePhone,
    CurrencyCode,
    CurrencySymbol,
    CurrencyDecimals,
    CurrencySymbolAfter,
    ReceiptHeader,
    ReceiptFooter,
    OrderFormat,
    InvoiceFormat,
    SkuFormat,
    MaxDiscountBps,
    MinMarginBps,
    TillVarianceAlertCents,
    SessionMinutes,
    LoyaltyPointsPerMajorUnit,
    LoyaltyRedeemValueCents,
    LabelColumns,
    LabelRows,
}

impl SettingKey {
    /// All known keys, in the order the settings page lists them.
    pub const ALL: &'static [SettingKey] = &[
        SettingKey::StoreName,
        SettingKey::StoreAddress,
        SettingKey::StorePhone,
        SettingKey::CurrencyCode,
        SettingKey::CurrencySymbol,
        SettingKey::CurrencyDecimals,
        SettingKey::CurrencySymbolAfter,
        SettingKey::ReceiptHeader,
        SettingKey::ReceiptFooter,
        SettingKey::OrderFormat,
        SettingKey::InvoiceFormat,
        SettingKey::SkuFormat,
        SettingKey::MaxDiscountBps,
        SettingKey::MinMarginBps,
        SettingKey::TillVarianceAlertCents,
        SettingKey::SessionMinutes,
        SettingKey::LoyaltyPointsPerMajorUnit,
        SettingKey::LoyaltyRedeemValueCents,
        SettingKey::LabelColumns,
        SettingKey::LabelRows,
    ];

    /// The dotted key string stored in the table.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SettingKey::StoreName => "store.name",
            SettingKey::StoreAddress => "store.address",
            SettingKey::StorePhone => "store.phone",
            SettingKey::CurrencyCode => "currency.code",
            SettingKey::CurrencySymbol => "currency.symbol",
            SettingKey::CurrencyDecimals => "currency.decimals",
            SettingKey::CurrencySymbolAfter => "currency.symbol_after",
            SettingKey::ReceiptHeader => "receipt.header",
            SettingKey::ReceiptFooter => "receipt.footer",
            SettingKey::OrderFormat => "numbering.order_format",
            SettingKey::InvoiceFormat => "numbering.invoice_format",
            SettingKey::SkuFormat => "numbering.sku_format",
            SettingKey::MaxDiscountBps => "security.max_discount_bps",
            SettingKey::MinMarginBps => "pricing.min_margin_bps",
            SettingKey::TillVarianceAlertCents => "security.till_variance_alert_cents",
            SettingKey::SessionMinutes => "security.session_minutes",
            SettingKey::LoyaltyPointsPerMajorUnit => "loyalty.points_per_major_unit",
            SettingKey::LoyaltyRedeemValueCents => "loyalty.redeem_value_cents",
            SettingKey::LabelColumns => "labels.columns",
            SettingKey::LabelRows => "labels.rows",
        }
    }

    /// Looks up a known key by its table string.
    pub fn from_key(key: &str) -> Option<SettingKey> {
        SettingKey::ALL.iter().copied().find(|k| k.as_str() == key)
    }
}

// =============================================================================
// Setting Row
// =============================================================================

/// One raw settings table row, as stored and as shown on the raw tab of the
/// settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SettingRow {
    pub key: String,
    pub value: String,
}

// =============================================================================
// Store Settings
// =============================================================================

/// Fully-typed view of the settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreSettings {
    /// Store name shown on receipts and labels.
    pub store_name: String,
    pub store_address: String,
    pub store_phone: String,

    /// Currency presentation used everywhere amounts render as text.
    pub currency: CurrencyFormat,

    /// Free text above the receipt body.
    pub receipt_header: String,
    /// Free text below the receipt body.
    pub receipt_footer: String,

    pub order_format: NumberFormat,
    pub invoice_format: NumberFormat,
    pub sku_format: NumberFormat,

    /// Largest discount a cashier may grant without manager approval.
    pub max_discount_bps: u32,

    /// Minimum margin enforced on derived selling-unit prices.
    pub min_margin_bps: u32,

    /// |till variance| above this flags the closed session for review.
    pub till_variance_alert_cents: i64,

    /// Admin session lifetime.
    pub session_minutes: u32,

    /// Loyalty points earned per currency major unit spent.
    pub loyalty_points_per_major_unit: i64,

    /// Redemption value of one loyalty point, in cents.
    pub loyalty_redeem_value_cents: i64,

    /// Default label sheet geometry.
    pub label_columns: u32,
    pub label_rows: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            store_name: "My Store".to_string(),
            store_address: String::new(),
            store_phone: String::new(),
            currency: CurrencyFormat::default(),
            receipt_header: "Thank you for shopping with us".to_string(),
            receipt_footer: "Returns within 30 days with receipt".to_string(),
            order_format: NumberFormat {
                prefix: "ORD-".to_string(),
                pad_width: 6,
                suffix: String::new(),
            },
            invoice_format: NumberFormat {
                prefix: "INV-".to_string(),
                pad_width: 6,
                suffix: String::new(),
            },
            sku_format: NumberFormat {
                prefix: "SKU-".to_string(),
                pad_width: 5,
                suffix: String::new(),
            },
            max_discount_bps: 2000,
            min_margin_bps: 1000,
            till_variance_alert_cents: 500,
            session_minutes: 480,
            loyalty_points_per_major_unit: 1,
            loyalty_redeem_value_cents: 1,
            label_columns: 3,
            label_rows: 8,
        }
    }
}

impl StoreSettings {
    /// Builds settings from stored rows layered over defaults.
    ///
    /// Total by construction: unknown keys are skipped and values that fail
    /// to parse or fall out of range keep the default for that key.
    pub fn merge<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut settings = StoreSettings::default();
        for (key, value) in rows {
            if let Some(known) = SettingKey::from_key(key) {
                // A bad stored value keeps the default
                let _ = settings.try_apply(known, value);
            }
        }
        settings
    }

    /// Renders every known key to its table row form.
    pub fn to_rows(&self) -> Vec<SettingRow> {
        SettingKey::ALL
            .iter()
            .map(|key| SettingRow {
                key: key.as_str().to_string(),
                value: self.render_value(*key),
            })
            .collect()
    }

    /// The canonical stored string for one key.
    pub fn render_value(&self, key: SettingKey) -> String {
        match key {
            SettingKey::StoreName => self.store_name.clone(),
            SettingKey::StoreAddress => self.store_address.clone(),
            SettingKey::StorePhone => self.store_phone.clone(),
            SettingKey::CurrencyCode => self.currency.code.clone(),
            SettingKey::CurrencySymbol => self.currency.symbol.clone(),
            SettingKey::CurrencyDecimals => self.currency.decimals.to_string(),
            SettingKey::CurrencySymbolAfter => self.currency.symbol_after.to_string(),
            SettingKey::ReceiptHeader => self.receipt_header.clone(),
            SettingKey::ReceiptFooter => self.receipt_footer.clone(),
            SettingKey::OrderFormat => self.order_format.pattern(),
            SettingKey::InvoiceFormat => self.invoice_format.pattern(),
            SettingKey::SkuFormat => self.sku_format.pattern(),
            SettingKey::MaxDiscountBps => self.max_discount_bps.to_string(),
            SettingKey::MinMarginBps => self.min_margin_bps.to_string(),
            SettingKey::TillVarianceAlertCents => self.till_variance_alert_cents.to_string(),
            SettingKey::SessionMinutes => self.session_minutes.to_string(),
            SettingKey::LoyaltyPointsPerMajorUnit => self.loyalty_points_per_major_unit.to_string(),
            SettingKey::LoyaltyRedeemValueCents => self.loyalty_redeem_value_cents.to_string(),
            SettingKey::LabelColumns => self.label_columns.to_string(),
            SettingKey::LabelRows => self.label_rows.to_string(),
        }
    }

    /// Validates one incoming key/value pair from a settings update.
    ///
    /// Known keys must parse and pass range checks. Unknown keys are
    /// accepted (length-capped) and upserted verbatim by the caller so
    /// other tools' settings survive an admin save.
    pub fn validate_update(key: &str, value: &str) -> Result<(), ValidationError> {
        if key.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "key".to_string(),
            });
        }
        if key.len() > 100 {
            return Err(ValidationError::TooLong {
                field: "key".to_string(),
                max: 100,
            });
        }
        if value.len() > 1000 {
            return Err(ValidationError::TooLong {
                field: "value".to_string(),
                max: 1000,
            });
        }

        match SettingKey::from_key(key) {
            Some(known) => StoreSettings::default().try_apply(known, value),
            None => Ok(()),
        }
    }

    /// Applies one known key. Fails without modifying anything when the
    /// value doesn't parse or is out of range.
    fn try_apply(&mut self, key: SettingKey, raw: &str) -> Result<(), ValidationError> {
        match key {
            SettingKey::StoreName => {
                self.store_name = parse_text(key, raw, 200)?;
            }
            SettingKey::StoreAddress => {
                self.store_address = parse_text(key, raw, 500)?;
            }
            SettingKey::StorePhone => {
                self.store_phone = parse_text(key, raw, 50)?;
            }
            SettingKey::CurrencyCode => {
                let code = parse_text(key, raw, 8)?;
                if code.is_empty() {
                    return Err(ValidationError::Required {
                        field: key.as_str().to_string(),
                    });
                }
                self.currency.code = code;
            }
            SettingKey::CurrencySymbol => {
                let symbol = parse_text(key, raw, 8)?;
                if symbol.is_empty() {
                    return Err(ValidationError::Required {
                        field: key.as_str().to_string(),
                    });
                }
                self.currency.symbol = symbol;
            }
            SettingKey::CurrencyDecimals => {
                self.currency.decimals = parse_int(key, raw, 0, 4)? as u8;
            }
            SettingKey::CurrencySymbolAfter => {
                self.currency.symbol_after = parse_bool(key, raw)?;
            }
            SettingKey::ReceiptHeader => {
                self.receipt_header = parse_text(key, raw, 500)?;
            }
            SettingKey::ReceiptFooter => {
                self.receipt_footer = parse_text(key, raw, 500)?;
            }
            SettingKey::OrderFormat => {
                self.order_format = NumberFormat::parse(raw)?;
            }
            SettingKey::InvoiceFormat => {
                self.invoice_format = NumberFormat::parse(raw)?;
            }
            SettingKey::SkuFormat => {
                self.sku_format = NumberFormat::parse(raw)?;
            }
            SettingKey::MaxDiscountBps => {
                self.max_discount_bps = parse_int(key, raw, 0, 10000)? as u32;
            }
            SettingKey::MinMarginBps => {
                self.min_margin_bps = parse_int(key, raw, 0, 10000)? as u32;
            }
            SettingKey::TillVarianceAlertCents => {
                self.till_variance_alert_cents = parse_int(key, raw, 0, 1_000_000)?;
            }
            SettingKey::SessionMinutes => {
                self.session_minutes = parse_int(key, raw, 5, 1440)? as u32;
            }
            SettingKey::LoyaltyPointsPerMajorUnit => {
                self.loyalty_points_per_major_unit = parse_int(key, raw, 0, 1000)?;
            }
            SettingKey::LoyaltyRedeemValueCents => {
                self.loyalty_redeem_value_cents = parse_int(key, raw, 0, 10000)?;
            }
            SettingKey::LabelColumns => {
                self.label_columns = parse_int(key, raw, 1, 12)? as u32;
            }
            SettingKey::LabelRows => {
                self.label_rows = parse_int(key, raw, 1, 20)? as u32;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Parse Helpers
// =============================================================================

fn parse_text(key: SettingKey, raw: &str, max: usize) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: key.as_str().to_string(),
            max,
        });
    }
    Ok(value.to_string())
}

fn parse_int(key: SettingKey, raw: &str, min: i64, max: i64) -> Result<i64, ValidationError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidFormat {
            field: key.as_str().to_string(),
            reason: "must be a number".to_string(),
        })?;
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: key.as_str().to_string(),
            min,
            max,
        });
    }
    Ok(value)
}

fn parse_bool(key: SettingKey, raw: &str) -> Result<bool, ValidationError> {
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ValidationError::InvalidFormat {
            field: key.as_str().to_string(),
            reason: "must be true or false".to_string(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
