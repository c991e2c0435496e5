//! Admin account endpoints.
//!
//! Accounts are soft-deleted like everything else; the session gate
//! rejects deactivated accounts on their next request. The one rule
//! beyond CRUD is that admins cannot deactivate themselves, which
//! keeps the store from locking out its last working login.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::info;

use backoffice_core::types::{Role, User};
use backoffice_core::validation::{validate_password, validate_username};
use backoffice_db::repository::user::generate_user_id;
use backoffice_db::UserRecord;

use crate::auth::{hash_password, Claims};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub password: String,
}

/// `GET /api/users`
pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<User>>> {
    let users = state.db.users().list().await?;
    Ok(Json(users))
}

/// `POST /api/users`
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let username = payload.username.trim().to_string();
    let display_name = payload
        .display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| username.clone());

    let now = chrono::Utc::now();
    let record = UserRecord {
        id: generate_user_id(),
        username,
        display_name,
        password_hash: hash_password(&payload.password)?,
        role: payload.role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.users().insert(&record).await?;
    info!(username = %record.username, role = ?record.role, "User created");

    Ok((StatusCode::CREATED, Json(record.into_user())))
}

/// `DELETE /api/users/{id}`
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if claims.sub == id {
        return Err(ApiError::Conflict(
            "Cannot deactivate your own account".to_string(),
        ));
    }

    state.db.users().soft_delete(&id).await?;
    info!(user_id = %id, "User deactivated");

    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/users/{id}/password`
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<PasswordChangeRequest>,
) -> ApiResult<StatusCode> {
    validate_password(&payload.password)?;

    let hash = hash_password(&payload.password)?;
    state.db.users().update_password(&id, &hash).await?;
    info!(user_id = %id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Unit Tests
// =============================================================================
