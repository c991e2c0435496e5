//! # Shelf-Label Sheets
//!
//! Lays a batch of labels onto sticker-sheet pages. The frontend renders
//! the result for print; this module only decides what goes in which slot.
//!
//! ## Sheet Geometry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  3 columns × 8 rows, start_offset 2 (first two stickers already used)  │
//! │                                                                         │
//! │     col 0    col 1    col 2                                            │
//! │   ┌────────┬────────┬────────┐                                         │
//! │   │ (used) │ (used) │ label1 │   row 0    slots fill row-major,        │
//! │   ├────────┼────────┼────────┤            spilling onto as many        │
//! │   │ label2 │ label3 │ label4 │   row 1    pages as needed              │
//! │   └────────┴────────┴────────┘                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Sheet Geometry
// =============================================================================

/// Sticker sheet geometry plus where to start on the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LabelTemplate {
    pub columns: u32,
    pub rows: u32,

    /// First slot to use on page one, for partially-used sheets.
    pub start_offset: u32,
}

impl LabelTemplate {
    pub fn slots_per_page(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    /// Checks geometry bounds; the offset must leave room on page one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=12).contains(&self.columns) {
            return Err(ValidationError::OutOfRange {
                field: "columns".to_string(),
                min: 1,
                max: 12,
            });
        }
        if !(1..=20).contains(&self.rows) {
            return Err(ValidationError::OutOfRange {
                field: "rows".to_string(),
                min: 1,
                max: 20,
            });
        }
        if self.start_offset as usize >= self.slots_per_page() {
            return Err(ValidationError::OutOfRange {
                field: "start_offset".to_string(),
                min: 0,
                max: self.slots_per_page() as i64 - 1,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Labels
// =============================================================================

/// One printable shelf label, fully resolved.
///
/// `price_text` is pre-rendered with the store's currency settings so the
/// print frontend never does money math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Label {
    pub name: String,
    pub sku: String,

    /// Normalized EAN-13, when the product's barcode validates.
    pub barcode: Option<String>,

    pub price_text: String,
    pub family_name: Option<String>,
}

/// One page of slots. `None` slots are skipped stickers (the offset) or
/// unused tail positions on the last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LabelPage {
    pub slots: Vec<Option<Label>>,
}

/// The laid-out sheet returned to the print frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LabelSheet {
    pub columns: u32,
    pub rows: u32,
    pub pages: Vec<LabelPage>,
}

/// Fills sheet pages with labels in row-major order.
///
/// The first `start_offset` slots of page one are left empty. An empty
/// label batch yields a sheet with no pages.
pub fn layout(template: &LabelTemplate, labels: Vec<Label>) -> Result<LabelSheet, ValidationError> {
    template.validate()?;

    let per_page = template.slots_per_page();
    let mut pages: Vec<LabelPage> = Vec::new();

    if !labels.is_empty() {
        let mut current: Vec<Option<Label>> = Vec::with_capacity(per_page);
        current.resize(template.start_offset as usize, None);

        for label in labels {
            if current.len() == per_page {
                pages.push(LabelPage { slots: current });
                current = Vec::with_capacity(per_page);
            }
            current.push(Some(label));
        }

        current.resize(per_page, None);
        pages.push(LabelPage { slots: current });
    }

    Ok(LabelSheet {
        columns: template.columns,
        rows: template.rows,
        pages,
    })
}

// =============================================================================
// Barcodes
// =============================================================================

/// EAN-13 check digit for a 12-digit payload.
///
/// Weights alternate 1,3 from the left; the check digit brings the weighted
/// sum to a multiple of ten. Returns None unless given exactly 12 ASCII
/// digits.
pub fn ean13_check_digit(digits: &str) -> Option<u32> {
    if digits.len() != 12 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sum: u32 = digits
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let digit = (b - b'0') as u32;
            if i % 2 == 0 {
                digit
            } else {
                digit * 3
            }
        })
        .sum();
    Some((10 - sum % 10) % 10)
}

/// Normalizes a stored barcode to a full EAN-13.
///
/// - 12 digits: the check digit is computed and appended
/// - 13 digits: the check digit is verified
/// - anything else: None (the label renders without a barcode)
pub fn normalize_ean13(barcode: &str) -> Option<String> {
    let barcode = barcode.trim();
    match barcode.len() {
        12 => {
            let check = ean13_check_digit(barcode)?;
            Some(format!("{}{}", barcode, check))
        }
        13 => {
            let check = ean13_check_digit(&barcode[..12])?;
            let last = barcode.as_bytes()[12];
            if last.is_ascii_digit() && (last - b'0') as u32 == check {
                Some(barcode.to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
