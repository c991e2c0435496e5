//! Product endpoints.
//!
//! Stock adjustments are deltas, not absolute writes, so two admins
//! receiving deliveries at the same time cannot clobber each other's
//! counts.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use backoffice_core::types::Product;
use backoffice_core::validation::{
    clamp_search_limit, validate_price_cents, validate_product_name, validate_search_query,
    validate_sku,
};
use backoffice_core::ValidationError;
use backoffice_db::repository::product::generate_product_id;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub family_id: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub family_id: Option<String>,
    pub price_cents: i64,
    pub cost_cents: i64,
    #[serde(default = "default_pack_quantity")]
    pub pack_quantity: i64,
    #[serde(default)]
    pub stock_on_hand: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_pack_quantity() -> i64 {
    1
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i64,
}

/// `GET /api/products?q=&family_id=&limit=`
///
/// With `family_id` set this lists that family's active products;
/// otherwise it runs the same prefix search the lookup module uses.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    if let Some(family_id) = &query.family_id {
        let products = state.db.products().list_by_family(family_id).await?;
        return Ok(Json(products));
    }

    let q = validate_search_query(query.q.as_deref().unwrap_or(""))?;
    let limit = clamp_search_limit(query.limit);
    let products = state.db.products().search(&q, limit).await?;

    Ok(Json(products))
}

/// `POST /api/products`
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProductPayload>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = validated_product(&state, generate_product_id(), payload).await?;

    let created = state.db.products().insert(&product).await?;
    info!(product_id = %created.id, sku = %created.sku, "Product created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/products/{id}`
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {}", id)))?;

    Ok(Json(product))
}

/// `PUT /api/products/{id}`
///
/// Full replace. `stock_on_hand` in the payload is ignored; stock moves
/// only through the delta endpoint below.
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ProductPayload>,
) -> ApiResult<Json<Product>> {
    let existing = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {}", id)))?;

    let mut product = validated_product(&state, existing.id.clone(), payload).await?;
    product.stock_on_hand = existing.stock_on_hand;
    product.created_at = existing.created_at;

    state.db.products().update(&product).await?;
    info!(product_id = %product.id, "Product updated");

    Ok(Json(product))
}

/// `DELETE /api/products/{id}`
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().soft_delete(&id).await?;
    info!(product_id = %id, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/products/{id}/stock`
///
/// Applies a signed delta (deliveries positive, shrinkage negative) and
/// returns the product with its new count.
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(adjustment): Json<StockAdjustment>,
) -> ApiResult<Json<Product>> {
    if adjustment.delta == 0 {
        return Err(ApiError::InvalidRequest(
            "Stock delta must be non-zero".to_string(),
        ));
    }

    state.db.products().update_stock(&id, adjustment.delta).await?;

    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {}", id)))?;

    info!(
        product_id = %id,
        delta = adjustment.delta,
        stock = product.stock_on_hand,
        "Stock adjusted"
    );

    Ok(Json(product))
}

/// Validates a payload and assembles the row to store.
async fn validated_product(
    state: &AppState,
    id: String,
    payload: ProductPayload,
) -> ApiResult<Product> {
    validate_sku(&payload.sku)?;
    validate_product_name(&payload.name)?;
    validate_price_cents(payload.price_cents)?;

    if payload.cost_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "cost".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }
    if payload.pack_quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "pack_quantity".to_string(),
        }
        .into());
    }

    if let Some(family_id) = &payload.family_id {
        let family = state.db.families().get(family_id).await?;
        if !family.map(|f| f.is_active).unwrap_or(false) {
            return Err(ApiError::InvalidRequest(format!(
                "Unknown product family: {}",
                family_id
            )));
        }
    }

    let now = chrono::Utc::now();
    Ok(Product {
        id,
        sku: payload.sku.trim().to_string(),
        barcode: payload.barcode.filter(|b| !b.trim().is_empty()),
        name: payload.name.trim().to_string(),
        description: payload.description,
        family_id: payload.family_id,
        price_cents: payload.price_cents,
        cost_cents: payload.cost_cents,
        pack_quantity: payload.pack_quantity,
        stock_on_hand: payload.stock_on_hand,
        is_active: payload.is_active,
        created_at: now,
        updated_at: now,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testutil;

    fn payload(sku: &str, name: &str) -> ProductPayload {
        ProductPayload {
            sku: sku.to_string(),
            barcode: None,
            name: name.to_string(),
            description: None,
            family_id: None,
            price_cents: 500,
            cost_cents: 300,
            pack_quantity: 1,
            stock_on_hand: 0,
            is_active: true,
        }
    }

    fn list_query(q: Option<&str>) -> Query<ListProductsQuery> {
        Query(ListProductsQuery {
            q: q.map(|s| s.to_string()),
            family_id: None,
            limit: None,
        })
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let state = testutil::state().await;

        let (status, created) =
            create_product(State(state.clone()), Json(payload("COLA-330", "Cola 330ml")))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let fetched = get_product(State(state), Path(created.0.id.clone()))
            .await
            .unwrap();
        assert_eq!(fetched.0.sku, "COLA-330");
    }

    #[tokio::test]
    async fn test_create_rejects_bad_sku() {
        let state = testutil::state().await;

        let err = create_product(State(state), Json(payload("has spaces", "X")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_sku_conflicts() {
        let state = testutil::state().await;

        create_product(State(state.clone()), Json(payload("COLA-330", "Cola")))
            .await
            .unwrap();
        let err = create_product(State(state), Json(payload("COLA-330", "Other cola")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_family() {
        let state = testutil::state().await;

        let mut p = payload("COLA-330", "Cola");
        p.family_id = Some("no-such-family".to_string());
        let err = create_product(State(state), Json(p)).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_search_matches_prefix() {
        let state = testutil::state().await;
        testutil::seed_product(&state, "COLA-330", None).await;
        testutil::seed_product(&state, "CHIPS-50", None).await;

        let hits = list_products(State(state), list_query(Some("COLA")))
            .await
            .unwrap();
        assert_eq!(hits.0.len(), 1);
        assert_eq!(hits.0[0].sku, "COLA-330");
    }

    #[tokio::test]
    async fn test_update_preserves_stock() {
        let state = testutil::state().await;
        let product = testutil::seed_product(&state, "COLA-330", None).await;

        let mut p = payload("COLA-330", "Cola 330ml can");
        p.stock_on_hand = 999_999;
        let updated = update_product(State(state), Path(product.id.clone()), Json(p))
            .await
            .unwrap();

        assert_eq!(updated.0.name, "Cola 330ml can");
        // Seeded with 100 on hand; the payload's figure is ignored.
        assert_eq!(updated.0.stock_on_hand, 100);
    }

    #[tokio::test]
    async fn test_stock_delta_applies_both_ways() {
        let state = testutil::state().await;
        let product = testutil::seed_product(&state, "COLA-330", None).await;

        let after = adjust_stock(
            State(state.clone()),
            Path(product.id.clone()),
            Json(StockAdjustment { delta: 24 }),
        )
        .await
        .unwrap();
        assert_eq!(after.0.stock_on_hand, 124);

        let after = adjust_stock(
            State(state),
            Path(product.id),
            Json(StockAdjustment { delta: -4 }),
        )
        .await
        .unwrap();
        assert_eq!(after.0.stock_on_hand, 120);
    }

    #[tokio::test]
    async fn test_zero_delta_rejected() {
        let state = testutil::state().await;
        let product = testutil::seed_product(&state, "COLA-330", None).await;

        let err = adjust_stock(
            State(state),
            Path(product.id),
            Json(StockAdjustment { delta: 0 }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_delete_hides_from_search() {
        let state = testutil::state().await;
        let product = testutil::seed_product(&state, "COLA-330", None).await;

        let status = delete_product(State(state.clone()), Path(product.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let hits = list_products(State(state), list_query(Some("COLA")))
            .await
            .unwrap();
        assert!(hits.0.is_empty());
    }
}
