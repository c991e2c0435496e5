//! Selling-unit (BOM) endpoints.
//!
//! A link ties a selling unit to the base product whose bulk stock it
//! consumes. Quotes are never stored: every read recomputes them from
//! the live base cost, retail price, stock and the store's minimum
//! margin, so a cost change reprices every derived unit at once.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use backoffice_core::bom::{
    check_stock, quote, sellable_units, BaseLot, PricingStrategy, UnitQuote,
};
use backoffice_core::types::{BomLink, Product};
use backoffice_core::validation::validate_quantity;
use backoffice_core::{CoreError, ValidationError};
use backoffice_db::repository::bom::generate_bom_link_id;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LinkPayload {
    pub base_product_id: String,
    pub unit_product_id: String,
    pub unit_quantity: i64,
    pub strategy: PricingStrategy,
}

#[derive(Debug, Deserialize)]
pub struct LinkUpdatePayload {
    pub unit_quantity: i64,
    pub strategy: PricingStrategy,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub sku: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct BaseQuotes {
    pub base: Product,
    pub min_margin_bps: u32,
    pub quotes: Vec<QuoteView>,
}

#[derive(Debug, Serialize)]
pub struct QuoteView {
    pub link: BomLink,
    pub unit_product: Product,
    pub quote: UnitQuote,
}

#[derive(Debug, Serialize)]
pub struct LinkView {
    pub link: BomLink,
    pub quote: UnitQuote,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub sku: String,

    /// False for plain products, which are checked against their own
    /// stock instead of a base product's.
    pub is_bom_unit: bool,

    pub sufficient: bool,
    pub available_units: i64,
    pub requested: i64,
}

/// `GET /api/bom/{base_id}/quotes`
///
/// Current quotes for every active selling unit of a base product.
pub async fn base_quotes(
    State(state): State<Arc<AppState>>,
    Path(base_id): Path<String>,
) -> ApiResult<Json<BaseQuotes>> {
    let base = state
        .db
        .products()
        .get_by_id(&base_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(base_id.clone()))?;

    let settings = state.db.settings().load().await?;
    let lot = base_lot(&base);

    let links = state.db.bom().links_for_base(&base.id).await?;
    let mut quotes = Vec::with_capacity(links.len());
    for link in links {
        let unit_product = state
            .db
            .products()
            .get_by_id(&link.unit_product_id)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(format!("BOM link {} references a missing product", link.id))
            })?;

        let quote = quote(&lot, link.unit_quantity, &link.strategy, settings.min_margin_bps)?;
        quotes.push(QuoteView {
            link,
            unit_product,
            quote,
        });
    }

    Ok(Json(BaseQuotes {
        base,
        min_margin_bps: settings.min_margin_bps,
        quotes,
    }))
}

/// `POST /api/bom/links`
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LinkPayload>,
) -> ApiResult<(StatusCode, Json<LinkView>)> {
    if payload.base_product_id == payload.unit_product_id {
        return Err(ValidationError::InvalidFormat {
            field: "unit_product_id".to_string(),
            reason: "a product cannot be its own selling unit".to_string(),
        }
        .into());
    }
    validate_quantity(payload.unit_quantity)?;

    let base = active_product(&state, &payload.base_product_id).await?;
    active_product(&state, &payload.unit_product_id).await?;

    if let Some(existing) = state.db.bom().link_for_unit(&payload.unit_product_id).await? {
        return Err(ApiError::Conflict(format!(
            "Product is already a selling unit of {}",
            existing.base_product_id
        )));
    }

    let settings = state.db.settings().load().await?;
    let quote = quote(
        &base_lot(&base),
        payload.unit_quantity,
        &payload.strategy,
        settings.min_margin_bps,
    )?;

    let now = chrono::Utc::now();
    let link = BomLink {
        id: generate_bom_link_id(),
        base_product_id: payload.base_product_id,
        unit_product_id: payload.unit_product_id,
        unit_quantity: payload.unit_quantity,
        strategy: payload.strategy,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let link = state.db.bom().insert(&link).await?;
    info!(
        link_id = %link.id,
        base = %link.base_product_id,
        unit = %link.unit_product_id,
        "BOM link created"
    );

    Ok((StatusCode::CREATED, Json(LinkView { link, quote })))
}

/// `PUT /api/bom/links/{id}`
pub async fn update_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<LinkUpdatePayload>,
) -> ApiResult<Json<LinkView>> {
    validate_quantity(payload.unit_quantity)?;

    let mut link = state
        .db
        .bom()
        .get(&id)
        .await?
        .filter(|l| l.is_active)
        .ok_or_else(|| ApiError::NotFound(format!("BOM link not found: {}", id)))?;

    let base = state
        .db
        .products()
        .get_by_id(&link.base_product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(link.base_product_id.clone()))?;

    link.unit_quantity = payload.unit_quantity;
    link.strategy = payload.strategy;

    let settings = state.db.settings().load().await?;
    let quote = quote(
        &base_lot(&base),
        link.unit_quantity,
        &link.strategy,
        settings.min_margin_bps,
    )?;

    state.db.bom().update(&link).await?;
    info!(link_id = %link.id, "BOM link updated");

    Ok(Json(LinkView { link, quote }))
}

/// `DELETE /api/bom/links/{id}`
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.bom().soft_delete(&id).await?;
    info!(link_id = %id, "BOM link deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/bom/check`
///
/// Can this SKU be sold in this quantity right now? For a selling unit
/// the answer comes from the base product's stock; for anything else,
/// from the product's own count.
pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckRequest>,
) -> ApiResult<Json<CheckResponse>> {
    validate_quantity(request.quantity)?;

    let product = state
        .db
        .products()
        .get_by_sku(request.sku.trim())
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| CoreError::ProductNotFound(request.sku.clone()))?;

    let Some(link) = state.db.bom().link_for_unit(&product.id).await? else {
        return Ok(Json(CheckResponse {
            sufficient: product.stock_on_hand >= request.quantity,
            available_units: product.stock_on_hand.max(0),
            is_bom_unit: false,
            sku: product.sku,
            requested: request.quantity,
        }));
    };

    let base = state
        .db
        .products()
        .get_by_id(&link.base_product_id)
        .await?
        .ok_or_else(|| {
            ApiError::Internal(format!("BOM link {} references a missing product", link.id))
        })?;

    let (sufficient, available_units) = match check_stock(
        &product.sku,
        base.stock_on_hand,
        link.unit_quantity,
        request.quantity,
    ) {
        Ok(()) => (
            true,
            sellable_units(base.stock_on_hand, link.unit_quantity),
        ),
        Err(CoreError::InsufficientStock { available, .. }) => (false, available),
        Err(other) => return Err(other.into()),
    };

    Ok(Json(CheckResponse {
        sku: product.sku,
        is_bom_unit: true,
        sufficient,
        available_units,
        requested: request.quantity,
    }))
}

/// Loads a product that must exist and be active, 404 otherwise.
async fn active_product(state: &AppState, id: &str) -> ApiResult<Product> {
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
}

fn base_lot(product: &Product) -> BaseLot {
    BaseLot {
        cost: product.cost(),
        pack_quantity: product.pack_quantity,
        retail: product.price(),
        stock_on_hand: product.stock_on_hand,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
