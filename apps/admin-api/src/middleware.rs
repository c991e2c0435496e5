//! Session and permission middleware.
//!
//! Every protected route passes two gates in order: the session check
//! (valid bearer token for an active account, claims stored in request
//! extensions) and the permission check (the session's role must carry
//! the route group's permission). Failures short-circuit with 401 and
//! 403 respectively.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use backoffice_core::types::Permission;

use crate::auth::{extract_bearer_token, Claims};
use crate::error::ApiError;
use crate::AppState;

/// Session check.
///
/// Validates the bearer token, confirms the account is still active,
/// and stores the decoded claims in request extensions for handlers
/// and the permission check downstream. Deactivating a user therefore
/// kills their sessions on the next request, not at token expiry.
pub async fn session_check(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let token = match extract_bearer_token(auth_header) {
        Some(token) => token,
        None => {
            warn!(path = %req.uri().path(), "Missing bearer token");
            return Err(ApiError::AuthFailed("Missing bearer token".to_string()).into_response());
        }
    };

    let claims = match state.sessions.validate_token(token) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(path = %req.uri().path(), "Session token rejected");
            return Err(err.into_response());
        }
    };

    match state.db.users().get_by_id(&claims.sub).await {
        Ok(Some(user)) if user.is_active => {}
        Ok(_) => {
            warn!(user_id = %claims.sub, "Session for missing or deactivated account");
            return Err(ApiError::AuthFailed("Account is not active".to_string()).into_response());
        }
        Err(err) => return Err(ApiError::from(err).into_response()),
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Permission check.
///
/// Compares the route group's required permission against the session's
/// role. Must run after [`session_check`], which provides the claims.
pub async fn permission_check(
    State(required): State<Permission>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let claims = match req.extensions().get::<Claims>() {
        Some(claims) => claims,
        None => {
            return Err(
                ApiError::Internal("Session gate not applied to route".to_string()).into_response(),
            );
        }
    };

    if !claims.role.can(required) {
        warn!(
            user_id = %claims.sub,
            role = ?claims.role,
            required = ?required,
            "Permission denied"
        );
        return Err(ApiError::Forbidden(format!(
            "{:?} role lacks the {:?} permission",
            claims.role, required
        ))
        .into_response());
    }

    Ok(next.run(req).await)
}
