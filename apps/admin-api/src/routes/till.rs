//! Register and till session endpoints.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open (float counted in)                                                │
//! │    │                                                                    │
//! │    ├── movements: cash_sale / paid_in / paid_out                        │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  close (drawer counted by denomination)                                 │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  expected = float + sales + paid in - paid out                          │
//! │  variance = counted - expected   → alert when |variance| > threshold    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One open session per register is enforced twice: a friendly check
//! here and a partial unique index underneath for the race window.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use backoffice_core::till::{
    reconcile, validate_denominations, CashExpectation, DenominationCount, Reconciliation,
};
use backoffice_core::types::{MovementKind, Register, TillMovement, TillSession, TillStatus};
use backoffice_core::{CoreError, Money, ValidationError};
use backoffice_db::repository::till::{
    generate_movement_id, generate_register_id, generate_session_id, SessionClose,
};
use backoffice_db::DbError;

use crate::auth::Claims;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub register_id: String,
    pub opening_float_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct MovementPayload {
    pub kind: MovementKind,
    pub amount_cents: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloseSessionRequest {
    pub denominations: Vec<DenominationCount>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CloseView {
    pub session: TillSession,
    pub reconciliation: Reconciliation,
}

fn validate_register_name(raw: &str) -> Result<&str, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
        });
    }
    Ok(name)
}

/// `GET /api/registers`
pub async fn list_registers(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Register>>> {
    let registers = state.db.till().list_registers().await?;
    Ok(Json(registers))
}

/// `POST /api/registers`
pub async fn create_register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> ApiResult<(StatusCode, Json<Register>)> {
    let name = validate_register_name(&payload.name)?;

    let now = chrono::Utc::now();
    let register = Register {
        id: generate_register_id(),
        name: name.to_string(),
        location: payload.location,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let created = state.db.till().insert_register(&register).await?;
    info!(register_id = %created.id, name = %created.name, "Register created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/registers/{id}`
///
/// Renames a register or moves it to another location.
pub async fn update_register(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<RegisterPayload>,
) -> ApiResult<Json<Register>> {
    let name = validate_register_name(&payload.name)?;

    let mut register = state
        .db
        .till()
        .get_register(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Register not found: {}", id)))?;

    register.name = name.to_string();
    register.location = payload.location;

    state.db.till().update_register(&register).await?;
    info!(register_id = %register.id, name = %register.name, "Register updated");

    Ok(Json(register))
}

/// `POST /api/till/open`
pub async fn open_session(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<OpenSessionRequest>,
) -> ApiResult<(StatusCode, Json<TillSession>)> {
    if payload.opening_float_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "opening_float".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    let register = state
        .db
        .till()
        .get_register(&payload.register_id)
        .await?
        .filter(|r| r.is_active)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Register not found: {}", payload.register_id))
        })?;

    if let Some(open) = state.db.till().get_open_session(&register.id).await? {
        warn!(register_id = %register.id, session_id = %open.id, "Register already open");
        return Err(CoreError::SessionAlreadyOpen {
            register_id: register.id,
        }
        .into());
    }

    let session = TillSession {
        id: generate_session_id(),
        register_id: register.id.clone(),
        status: TillStatus::Open,
        opened_by: claims.sub.clone(),
        opening_float_cents: payload.opening_float_cents,
        closed_by: None,
        denominations: None,
        counted_cents: None,
        expected_cents: None,
        variance_cents: None,
        notes: None,
        opened_at: chrono::Utc::now(),
        closed_at: None,
    };

    // The partial unique index catches two simultaneous opens; the loser
    // surfaces as a conflict.
    state.db.till().open_session(&session).await?;
    info!(
        session_id = %session.id,
        register_id = %session.register_id,
        float = session.opening_float_cents,
        "Till session opened"
    );

    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /api/till/{session_id}/movements`
///
/// Paid-in and paid-out movements must carry a reason; they are the
/// audit trail for cash entering or leaving outside of sales.
pub async fn add_movement(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<MovementPayload>,
) -> ApiResult<(StatusCode, Json<TillMovement>)> {
    let session = require_open_session(&state, &session_id).await?;

    if payload.amount_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        }
        .into());
    }

    let reason = payload.reason.filter(|r| !r.trim().is_empty());
    if reason.is_none() && matches!(payload.kind, MovementKind::PaidIn | MovementKind::PaidOut) {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        }
        .into());
    }

    let movement = TillMovement {
        id: generate_movement_id(),
        session_id: session.id.clone(),
        kind: payload.kind,
        amount_cents: payload.amount_cents,
        reason,
        created_at: chrono::Utc::now(),
    };

    state
        .db
        .till()
        .add_movement(&movement)
        .await
        .map_err(|err| closed_underneath(err, &session.id))?;

    info!(
        session_id = %movement.session_id,
        kind = ?movement.kind,
        amount = movement.amount_cents,
        "Till movement recorded"
    );

    Ok((StatusCode::CREATED, Json(movement)))
}

/// `POST /api/till/{session_id}/close`
///
/// Reconciles the counted drawer against the session's expectation and
/// stores the outcome on the session row.
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
    Json(payload): Json<CloseSessionRequest>,
) -> ApiResult<Json<CloseView>> {
    let session = require_open_session(&state, &session_id).await?;

    validate_denominations(&payload.denominations)?;

    let totals = state.db.till().movement_totals(&session.id).await?;
    let expectation = CashExpectation {
        opening_float: Money::from_cents(session.opening_float_cents),
        cash_sales: Money::from_cents(totals.cash_sales),
        paid_in: Money::from_cents(totals.paid_in),
        paid_out: Money::from_cents(totals.paid_out),
    };

    let settings = state.db.settings().load().await?;
    let reconciliation = reconcile(
        &expectation,
        &payload.denominations,
        Money::from_cents(settings.till_variance_alert_cents),
    );

    if reconciliation.over_threshold {
        warn!(
            session_id = %session.id,
            variance = reconciliation.variance_cents,
            threshold = settings.till_variance_alert_cents,
            "Till variance over alert threshold"
        );
    }

    let close = SessionClose {
        session_id: session.id.clone(),
        closed_by: claims.sub.clone(),
        denominations: payload.denominations,
        counted_cents: reconciliation.counted_cents,
        expected_cents: reconciliation.expected_cents,
        variance_cents: reconciliation.variance_cents,
        notes: payload.notes,
        closed_at: chrono::Utc::now(),
    };

    state
        .db
        .till()
        .close_session(&close)
        .await
        .map_err(|err| closed_underneath(err, &session.id))?;

    let session = state
        .db
        .till()
        .get_session(&session.id)
        .await?
        .ok_or_else(|| ApiError::Internal("Closed session vanished".to_string()))?;

    info!(
        session_id = %session.id,
        variance = reconciliation.variance_cents,
        "Till session closed"
    );

    Ok(Json(CloseView {
        session,
        reconciliation,
    }))
}

/// Loads a session, 404 when missing, 409 when already closed.
async fn require_open_session(state: &AppState, session_id: &str) -> ApiResult<TillSession> {
    let session = state
        .db
        .till()
        .get_session(session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Till session not found: {}", session_id)))?;

    if session.status == TillStatus::Closed {
        return Err(CoreError::SessionClosed {
            session_id: session.id,
        }
        .into());
    }

    Ok(session)
}

/// The status-guarded writes report NotFound when the session closed
/// between our check and the write; surface that as the conflict it is.
fn closed_underneath(err: DbError, session_id: &str) -> ApiError {
    match err {
        DbError::NotFound { .. } => CoreError::SessionClosed {
            session_id: session_id.to_string(),
        }
        .into(),
        other => other.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use backoffice_core::types::Role;

    use crate::testutil;

    fn d(denomination_cents: i64, quantity: i64) -> DenominationCount {
        DenominationCount {
            denomination_cents,
            quantity,
        }
    }

    async fn open_for_test(
        state: &Arc<AppState>,
        register_id: &str,
        claims: &Claims,
        float_cents: i64,
    ) -> TillSession {
        let (_, session) = open_session(
            State(state.clone()),
            Extension(claims.clone()),
            Json(OpenSessionRequest {
                register_id: register_id.to_string(),
                opening_float_cents: float_cents,
            }),
        )
        .await
        .unwrap();
        session.0
    }

    async fn record_sale(state: &Arc<AppState>, session_id: &str, amount_cents: i64) {
        add_movement(
            State(state.clone()),
            Path(session_id.to_string()),
            Json(MovementPayload {
                kind: MovementKind::CashSale,
                amount_cents,
                reason: None,
            }),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_register_create_and_list() {
        let state = testutil::state().await;

        let (status, created) = create_register(
            State(state.clone()),
            Json(RegisterPayload {
                name: "Front".to_string(),
                location: Some("By the door".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let registers = list_registers(State(state)).await.unwrap();
        assert_eq!(registers.0.len(), 1);
        assert_eq!(registers.0[0].id, created.0.id);
    }

    #[tokio::test]
    async fn test_register_blank_name_rejected() {
        let state = testutil::state().await;

        let err = create_register(
            State(state),
            Json(RegisterPayload {
                name: "  ".to_string(),
                location: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_rename() {
        let state = testutil::state().await;
        let register = testutil::seed_register(&state, "Front").await;

        let updated = update_register(
            State(state.clone()),
            Path(register.id.clone()),
            Json(RegisterPayload {
                name: "Front Counter".to_string(),
                location: Some("By the window".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.0.name, "Front Counter");
        assert_eq!(updated.0.location.as_deref(), Some("By the window"));

        let err = update_register(
            State(state),
            Path("reg-missing".to_string()),
            Json(RegisterPayload {
                name: "Anything".to_string(),
                location: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_one_open_session_per_register() {
        let state = testutil::state().await;
        let user = testutil::seed_user(&state, "manager", Role::Manager).await;
        let claims = testutil::claims_for(&user);
        let register = testutil::seed_register(&state, "Front").await;

        open_for_test(&state, &register.id, &claims, 20_000).await;

        let err = open_session(
            State(state.clone()),
            Extension(claims.clone()),
            Json(OpenSessionRequest {
                register_id: register.id.clone(),
                opening_float_cents: 20_000,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // A second register opens independently.
        let other = testutil::seed_register(&state, "Back").await;
        open_for_test(&state, &other.id, &claims, 15_000).await;
    }

    #[tokio::test]
    async fn test_open_unknown_register_is_404() {
        let state = testutil::state().await;
        let user = testutil::seed_user(&state, "manager", Role::Manager).await;

        let err = open_session(
            State(state),
            Extension(testutil::claims_for(&user)),
            Json(OpenSessionRequest {
                register_id: "no-such-register".to_string(),
                opening_float_cents: 0,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_negative_float_rejected() {
        let state = testutil::state().await;
        let user = testutil::seed_user(&state, "manager", Role::Manager).await;
        let register = testutil::seed_register(&state, "Front").await;

        let err = open_session(
            State(state),
            Extension(testutil::claims_for(&user)),
            Json(OpenSessionRequest {
                register_id: register.id,
                opening_float_cents: -1,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_paid_out_requires_reason() {
        let state = testutil::state().await;
        let user = testutil::seed_user(&state, "manager", Role::Manager).await;
        let claims = testutil::claims_for(&user);
        let register = testutil::seed_register(&state, "Front").await;
        let session = open_for_test(&state, &register.id, &claims, 20_000).await;

        let err = add_movement(
            State(state),
            Path(session.id),
            Json(MovementPayload {
                kind: MovementKind::PaidOut,
                amount_cents: 2_000,
                reason: Some("   ".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_close_reconciles_drawer() {
        let state = testutil::state().await;
        let user = testutil::seed_user(&state, "manager", Role::Manager).await;
        let claims = testutil::claims_for(&user);
        let register = testutil::seed_register(&state, "Front").await;
        let session = open_for_test(&state, &register.id, &claims, 20_000).await;

        record_sale(&state, &session.id, 4_550).await;
        add_movement(
            State(state.clone()),
            Path(session.id.clone()),
            Json(MovementPayload {
                kind: MovementKind::PaidIn,
                amount_cents: 5_000,
                reason: Some("Change from safe".to_string()),
            }),
        )
        .await
        .unwrap();
        add_movement(
            State(state.clone()),
            Path(session.id.clone()),
            Json(MovementPayload {
                kind: MovementKind::PaidOut,
                amount_cents: 2_000,
                reason: Some("Window cleaner".to_string()),
            }),
        )
        .await
        .unwrap();

        // Expected: 200.00 + 45.50 + 50.00 - 20.00 = 275.50; counted 275.00.
        let view = close_session(
            State(state),
            Extension(claims),
            Path(session.id.clone()),
            Json(CloseSessionRequest {
                denominations: vec![d(2_500, 11)],
                notes: Some("Quiet day".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(view.0.reconciliation.expected_cents, 27_550);
        assert_eq!(view.0.reconciliation.counted_cents, 27_500);
        assert_eq!(view.0.reconciliation.variance_cents, -50);
        assert!(!view.0.reconciliation.over_threshold);

        assert_eq!(view.0.session.status, TillStatus::Closed);
        assert_eq!(view.0.session.counted_cents, Some(27_500));
        assert_eq!(view.0.session.variance_cents, Some(-50));
        assert_eq!(view.0.session.closed_by.as_deref(), Some(user.id.as_str()));
    }

    #[tokio::test]
    async fn test_large_variance_sets_alert_flag() {
        let state = testutil::state().await;
        let user = testutil::seed_user(&state, "manager", Role::Manager).await;
        let claims = testutil::claims_for(&user);
        let register = testutil::seed_register(&state, "Front").await;
        let session = open_for_test(&state, &register.id, &claims, 20_000).await;

        // Drawer is $10 short; default threshold is $5.
        let view = close_session(
            State(state),
            Extension(claims),
            Path(session.id),
            Json(CloseSessionRequest {
                denominations: vec![d(1_000, 19)],
                notes: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(view.0.reconciliation.variance_cents, -1_000);
        assert!(view.0.reconciliation.over_threshold);
    }

    #[tokio::test]
    async fn test_closed_session_rejects_movements_and_reclose() {
        let state = testutil::state().await;
        let user = testutil::seed_user(&state, "manager", Role::Manager).await;
        let claims = testutil::claims_for(&user);
        let register = testutil::seed_register(&state, "Front").await;
        let session = open_for_test(&state, &register.id, &claims, 20_000).await;

        close_session(
            State(state.clone()),
            Extension(claims.clone()),
            Path(session.id.clone()),
            Json(CloseSessionRequest {
                denominations: vec![d(2_000, 10)],
                notes: None,
            }),
        )
        .await
        .unwrap();

        let movement_err = add_movement(
            State(state.clone()),
            Path(session.id.clone()),
            Json(MovementPayload {
                kind: MovementKind::CashSale,
                amount_cents: 100,
                reason: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(movement_err, ApiError::Conflict(_)));

        let reclose_err = close_session(
            State(state),
            Extension(claims),
            Path(session.id),
            Json(CloseSessionRequest {
                denominations: vec![d(2_000, 10)],
                notes: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(reclose_err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_close_requires_a_count() {
        let state = testutil::state().await;
        let user = testutil::seed_user(&state, "manager", Role::Manager).await;
        let claims = testutil::claims_for(&user);
        let register = testutil::seed_register(&state, "Front").await;
        let session = open_for_test(&state, &register.id, &claims, 20_000).await;

        let err = close_session(
            State(state),
            Extension(claims),
            Path(session.id),
            Json(CloseSessionRequest {
                denominations: vec![],
                notes: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
