//! Product family endpoints.
//!
//! Deletion is guarded: a family that still has active products cannot
//! be removed, the admin must reassign or deactivate those products
//! first. The guard reports the live product count so the error message
//! tells the admin how much work is left.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use backoffice_core::types::{FamilyWithCount, Product, ProductFamily};
use backoffice_core::validation::validate_family_name;
use backoffice_core::CoreError;
use backoffice_db::repository::family::generate_family_id;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FamilyPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FamilyDetail {
    pub family: ProductFamily,
    pub products: Vec<Product>,
}

/// `GET /api/families`
///
/// Active families with their active product counts, in display order.
pub async fn list_families(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<FamilyWithCount>>> {
    let families = state.db.families().list().await?;
    Ok(Json(families))
}

/// `POST /api/families`
pub async fn create_family(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FamilyPayload>,
) -> ApiResult<(StatusCode, Json<ProductFamily>)> {
    validate_family_name(&payload.name)?;

    let now = chrono::Utc::now();
    let family = ProductFamily {
        id: generate_family_id(),
        name: payload.name.trim().to_string(),
        description: payload.description,
        display_order: payload.display_order.unwrap_or(0),
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let created = state.db.families().insert(&family).await?;
    info!(family_id = %created.id, name = %created.name, "Family created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/families/{id}`
///
/// The family plus its active products, which is what the family detail
/// page renders.
pub async fn get_family(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<FamilyDetail>> {
    let family = state
        .db
        .families()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product family not found: {}", id)))?;

    let products = state.db.products().list_by_family(&family.id).await?;

    Ok(Json(FamilyDetail { family, products }))
}

/// `PUT /api/families/{id}`
pub async fn update_family(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<FamilyPayload>,
) -> ApiResult<Json<ProductFamily>> {
    validate_family_name(&payload.name)?;

    let mut family = state
        .db
        .families()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product family not found: {}", id)))?;

    family.name = payload.name.trim().to_string();
    family.description = payload.description;
    family.display_order = payload.display_order.unwrap_or(family.display_order);

    state.db.families().update(&family).await?;
    info!(family_id = %family.id, "Family updated");

    Ok(Json(family))
}

/// `DELETE /api/families/{id}`
///
/// Refused with 409 while active products still reference the family.
pub async fn delete_family(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let family = state
        .db
        .families()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product family not found: {}", id)))?;

    let active_products = state.db.families().active_product_count(&id).await?;
    if active_products > 0 {
        return Err(CoreError::FamilyNotEmpty {
            name: family.name,
            active_products,
        }
        .into());
    }

    state.db.families().soft_delete(&id).await?;
    info!(family_id = %id, "Family deleted");

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Unit Tests
// =============================================================================
