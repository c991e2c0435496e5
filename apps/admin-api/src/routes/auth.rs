//! Login endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use backoffice_core::types::User;

use crate::auth::verify_password;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// `POST /api/auth/login`
///
/// Token lifetime comes from the `security.session_minutes` setting.
/// Unknown account, deactivated account and wrong password all return
/// the same message, so the response does not reveal which usernames
/// exist.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let invalid = || ApiError::AuthFailed("Invalid username or password".to_string());

    let record = state
        .db
        .users()
        .get_by_username(req.username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !record.is_active || !verify_password(&req.password, &record.password_hash) {
        warn!(username = %record.username, "Failed login attempt");
        return Err(invalid());
    }

    let settings = state.db.settings().load().await?;
    let lifetime_secs = i64::from(settings.session_minutes) * 60;

    let user = record.into_user();
    let token = state.sessions.issue_token(&user, lifetime_secs)?;
    let expires_at = Utc::now() + Duration::seconds(lifetime_secs);

    info!(username = %user.username, role = ?user.role, "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        expires_at,
        user,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use backoffice_core::types::Role;

    use crate::testutil;

    fn request(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn test_login_issues_validatable_token() {
        let state = testutil::state().await;
        testutil::seed_user(&state, "boss", Role::Admin).await;

        let response = login(State(state.clone()), request("boss", "password-123"))
            .await
            .unwrap();

        assert_eq!(response.0.user.username, "boss");
        assert!(response.0.expires_at > Utc::now());

        let claims = state.sessions.validate_token(&response.0.token).unwrap();
        assert_eq!(claims.sub, response.0.user.id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_login_trims_username() {
        let state = testutil::state().await;
        testutil::seed_user(&state, "boss", Role::Admin).await;

        let response = login(State(state), request("  boss  ", "password-123")).await;
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let state = testutil::state().await;
        testutil::seed_user(&state, "boss", Role::Admin).await;

        let err = login(State(state), request("boss", "wrong-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn test_unknown_user_gets_same_message_as_wrong_password() {
        let state = testutil::state().await;
        testutil::seed_user(&state, "boss", Role::Admin).await;

        let unknown = login(State(state.clone()), request("ghost", "password-123"))
            .await
            .unwrap_err();
        let wrong = login(State(state), request("boss", "nope-nope-nope"))
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_deactivated_account_cannot_login() {
        let state = testutil::state().await;
        let user = testutil::seed_user(&state, "leaver", Role::Manager).await;
        state.db.users().soft_delete(&user.id).await.unwrap();

        let err = login(State(state), request("leaver", "password-123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthFailed(_)));
    }
}
