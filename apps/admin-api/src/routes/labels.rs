//! Shelf-label sheet endpoint.
//!
//! Turns a mixed batch of product and family requests into a laid-out
//! sticker sheet. Prices are rendered here with the store's currency
//! settings and barcodes are normalized to EAN-13, so the print page
//! receives print-ready text only.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use backoffice_core::labels::{layout, normalize_ean13, Label, LabelSheet, LabelTemplate};
use backoffice_core::types::Product;
use backoffice_core::validation::validate_label_copies;
use backoffice_core::{CoreError, StoreSettings, ValidationError};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SheetRequest {
    pub requests: Vec<LabelRequest>,

    /// Geometry override; defaults to the store's configured sheet.
    #[serde(default)]
    pub template: Option<LabelTemplate>,
}

/// One line of the batch: a single product or a whole family.
#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub family_id: Option<String>,
    #[serde(default = "default_copies")]
    pub copies: i64,
}

fn default_copies() -> i64 {
    1
}

/// `POST /api/labels/sheet`
pub async fn build_sheet(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SheetRequest>,
) -> ApiResult<Json<LabelSheet>> {
    let settings = state.db.settings().load().await?;

    let template = payload.template.unwrap_or(LabelTemplate {
        columns: settings.label_columns,
        rows: settings.label_rows,
        start_offset: 0,
    });
    template.validate()?;

    let mut family_names: HashMap<String, Option<String>> = HashMap::new();
    let mut labels = Vec::new();

    for request in payload.requests {
        validate_label_copies(request.copies)?;

        let products = match (&request.product_id, &request.family_id) {
            (Some(product_id), None) => {
                let product = state
                    .db
                    .products()
                    .get_by_id(product_id)
                    .await?
                    .filter(|p| p.is_active)
                    .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;
                vec![product]
            }
            (None, Some(family_id)) => {
                let family = state
                    .db
                    .families()
                    .get(family_id)
                    .await?
                    .filter(|f| f.is_active)
                    .ok_or_else(|| {
                        ApiError::NotFound(format!("Product family not found: {}", family_id))
                    })?;
                family_names.insert(family.id.clone(), Some(family.name.clone()));
                state.db.products().list_by_family(family_id).await?
            }
            _ => {
                return Err(ValidationError::InvalidFormat {
                    field: "request".to_string(),
                    reason: "exactly one of product_id or family_id is required".to_string(),
                }
                .into());
            }
        };

        for product in products {
            let family_name = resolve_family_name(&state, &mut family_names, &product).await?;
            let label = build_label(&settings, &product, family_name);
            for _ in 0..request.copies {
                labels.push(label.clone());
            }
        }
    }

    let sheet = layout(&template, labels)?;
    info!(pages = sheet.pages.len(), "Label sheet built");

    Ok(Json(sheet))
}

/// Family names for label subtitles, fetched once per family per batch.
async fn resolve_family_name(
    state: &AppState,
    cache: &mut HashMap<String, Option<String>>,
    product: &Product,
) -> ApiResult<Option<String>> {
    let Some(family_id) = &product.family_id else {
        return Ok(None);
    };

    if let Some(name) = cache.get(family_id) {
        return Ok(name.clone());
    }

    let name = state
        .db
        .families()
        .get(family_id)
        .await?
        .map(|family| family.name);
    cache.insert(family_id.clone(), name.clone());

    Ok(name)
}

fn build_label(settings: &StoreSettings, product: &Product, family_name: Option<String>) -> Label {
    Label {
        name: product.name.clone(),
        sku: product.sku.clone(),
        barcode: product.barcode.as_deref().and_then(normalize_ean13),
        price_text: settings.currency.format(product.price()),
        family_name,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
