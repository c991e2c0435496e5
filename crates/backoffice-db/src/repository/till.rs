//! # Till Repository
//!
//! Database operations for registers, till sessions and cash movements.
//!
//! ## Session Integrity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Open Session Per Register                        │
//! │                                                                         │
//! │  till_sessions                                                         │
//! │  ┌────────┬──────────┬────────┐                                        │
//! │  │ id     │ register │ status │                                        │
//! │  ├────────┼──────────┼────────┤   partial unique index on              │
//! │  │ s-1    │ REG-1    │ closed │   (register_id) WHERE status='open'    │
//! │  │ s-2    │ REG-1    │ open   │ ← only one of these per register       │
//! │  │ s-3    │ REG-2    │ open   │                                        │
//! │  └────────┴──────────┴────────┘                                        │
//! │                                                                         │
//! │  Movements may only attach to an open session, and closing writes      │
//! │  the frozen count columns exactly once (status-guarded UPDATE).        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use backoffice_core::till::DenominationCount;
use backoffice_core::{Register, TillMovement, TillSession, TillStatus};

const SESSION_COLUMNS: &str = "id, register_id, status, opened_by, opening_float_cents, \
     closed_by, denominations, counted_cents, expected_cents, variance_cents, \
     notes, opened_at, closed_at";

/// Raw till_sessions row. The denominations column holds JSON, so rows are
/// decoded into [`TillSession`] through [`TillSessionRow::into_session`].
#[derive(Debug, sqlx::FromRow)]
struct TillSessionRow {
    id: String,
    register_id: String,
    status: TillStatus,
    opened_by: String,
    opening_float_cents: i64,
    closed_by: Option<String>,
    denominations: Option<String>,
    counted_cents: Option<i64>,
    expected_cents: Option<i64>,
    variance_cents: Option<i64>,
    notes: Option<String>,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl TillSessionRow {
    fn into_session(self) -> DbResult<TillSession> {
        let denominations = match self.denominations {
            Some(json) => Some(serde_json::from_str(&json).map_err(|e| {
                DbError::Internal(format!("bad denominations JSON on session {}: {e}", self.id))
            })?),
            None => None,
        };

        Ok(TillSession {
            id: self.id,
            register_id: self.register_id,
            status: self.status,
            opened_by: self.opened_by,
            opening_float_cents: self.opening_float_cents,
            closed_by: self.closed_by,
            denominations,
            counted_cents: self.counted_cents,
            expected_cents: self.expected_cents,
            variance_cents: self.variance_cents,
            notes: self.notes,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
        })
    }
}

/// Per-kind movement sums for one session, in cents.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct MovementTotals {
    pub cash_sales: i64,
    pub paid_in: i64,
    pub paid_out: i64,
}

/// Everything written when a session is closed.
///
/// Built by the close handler after reconciliation; persisted in one
/// status-guarded UPDATE.
#[derive(Debug, Clone)]
pub struct SessionClose {
    pub session_id: String,
    pub closed_by: String,
    pub denominations: Vec<DenominationCount>,
    pub counted_cents: i64,
    pub expected_cents: i64,
    pub variance_cents: i64,
    pub notes: Option<String>,
    pub closed_at: DateTime<Utc>,
}

/// Repository for register and till session operations.
#[derive(Debug, Clone)]
pub struct TillRepository {
    pool: SqlitePool,
}

impl TillRepository {
    /// Creates a new TillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TillRepository { pool }
    }

    // =========================================================================
    // Registers
    // =========================================================================

    /// Lists active registers sorted by name.
    pub async fn list_registers(&self) -> DbResult<Vec<Register>> {
        let registers = sqlx::query_as::<_, Register>(
            r#"
            SELECT id, name, location, is_active, created_at, updated_at
            FROM registers
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(registers)
    }

    /// Gets a register by ID.
    pub async fn get_register(&self, id: &str) -> DbResult<Option<Register>> {
        let register = sqlx::query_as::<_, Register>(
            r#"
            SELECT id, name, location, is_active, created_at, updated_at
            FROM registers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(register)
    }

    /// Inserts a new register.
    pub async fn insert_register(&self, register: &Register) -> DbResult<Register> {
        debug!(name = %register.name, "Inserting register");

        sqlx::query(
            r#"
            INSERT INTO registers (id, name, location, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&register.id)
        .bind(&register.name)
        .bind(&register.location)
        .bind(register.is_active)
        .bind(register.created_at)
        .bind(register.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(register.clone())
    }

    /// Updates a register's name and location.
    pub async fn update_register(&self, register: &Register) -> DbResult<()> {
        debug!(id = %register.id, "Updating register");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE registers SET
                name = ?2,
                location = ?3,
                updated_at = ?4
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(&register.id)
        .bind(&register.name)
        .bind(&register.location)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Register", &register.id));
        }

        Ok(())
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Opens a new till session.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the register already has an open
    ///   session (partial unique index)
    pub async fn open_session(&self, session: &TillSession) -> DbResult<()> {
        debug!(
            register_id = %session.register_id,
            float = %session.opening_float_cents,
            "Opening till session"
        );

        sqlx::query(
            r#"
            INSERT INTO till_sessions (
                id, register_id, status, opened_by, opening_float_cents, opened_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&session.id)
        .bind(&session.register_id)
        .bind(session.status)
        .bind(&session.opened_by)
        .bind(session.opening_float_cents)
        .bind(session.opened_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a session by ID.
    pub async fn get_session(&self, id: &str) -> DbResult<Option<TillSession>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM till_sessions WHERE id = ?1");

        let row = sqlx::query_as::<_, TillSessionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TillSessionRow::into_session).transpose()
    }

    /// Gets the open session for a register, if any.
    pub async fn get_open_session(&self, register_id: &str) -> DbResult<Option<TillSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM till_sessions \
             WHERE register_id = ?1 AND status = 'open'"
        );

        let row = sqlx::query_as::<_, TillSessionRow>(&sql)
            .bind(register_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TillSessionRow::into_session).transpose()
    }

    /// Lists recent sessions, newest first, optionally for one register.
    pub async fn recent_sessions(
        &self,
        register_id: Option<&str>,
        limit: i64,
    ) -> DbResult<Vec<TillSession>> {
        let rows = match register_id {
            Some(register_id) => {
                let sql = format!(
                    "SELECT {SESSION_COLUMNS} FROM till_sessions \
                     WHERE register_id = ?1 \
                     ORDER BY opened_at DESC LIMIT ?2"
                );
                sqlx::query_as::<_, TillSessionRow>(&sql)
                    .bind(register_id)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {SESSION_COLUMNS} FROM till_sessions \
                     ORDER BY opened_at DESC LIMIT ?1"
                );
                sqlx::query_as::<_, TillSessionRow>(&sql)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(TillSessionRow::into_session).collect()
    }

    /// Closes a session, writing the frozen count columns.
    ///
    /// Status-guarded: a session can only move open → closed once.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no open session with this ID
    pub async fn close_session(&self, close: &SessionClose) -> DbResult<()> {
        debug!(session_id = %close.session_id, "Closing till session");

        let denominations_json = serde_json::to_string(&close.denominations)
            .map_err(|e| DbError::Internal(format!("encoding denominations: {e}")))?;

        let result = sqlx::query(
            r#"
            UPDATE till_sessions SET
                status = 'closed',
                closed_by = ?2,
                denominations = ?3,
                counted_cents = ?4,
                expected_cents = ?5,
                variance_cents = ?6,
                notes = ?7,
                closed_at = ?8
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(&close.session_id)
        .bind(&close.closed_by)
        .bind(&denominations_json)
        .bind(close.counted_cents)
        .bind(close.expected_cents)
        .bind(close.variance_cents)
        .bind(&close.notes)
        .bind(close.closed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open till session", &close.session_id));
        }

        Ok(())
    }

    // =========================================================================
    // Movements
    // =========================================================================

    /// Records a cash movement against an open session.
    ///
    /// The INSERT carries its own open-status guard, so a movement can never
    /// attach to a closed session even if the caller's check raced a close.
    pub async fn add_movement(&self, movement: &TillMovement) -> DbResult<()> {
        debug!(
            session_id = %movement.session_id,
            amount = %movement.amount_cents,
            "Recording till movement"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO till_movements (id, session_id, kind, amount_cents, reason, created_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6
            WHERE EXISTS (
                SELECT 1 FROM till_sessions WHERE id = ?2 AND status = 'open'
            )
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.session_id)
        .bind(movement.kind)
        .bind(movement.amount_cents)
        .bind(&movement.reason)
        .bind(movement.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open till session", &movement.session_id));
        }

        Ok(())
    }

    /// Lists a session's movements in posting order.
    pub async fn movements(&self, session_id: &str) -> DbResult<Vec<TillMovement>> {
        let movements = sqlx::query_as::<_, TillMovement>(
            r#"
            SELECT id, session_id, kind, amount_cents, reason, created_at
            FROM till_movements
            WHERE session_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Sums a session's movements per kind.
    ///
    /// Feeds the expected-cash calculation at close:
    /// expected = float + cash_sales + paid_in - paid_out.
    pub async fn movement_totals(&self, session_id: &str) -> DbResult<MovementTotals> {
        let totals = sqlx::query_as::<_, MovementTotals>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'cash_sale' THEN amount_cents END), 0) AS cash_sales,
                COALESCE(SUM(CASE WHEN kind = 'paid_in' THEN amount_cents END), 0) AS paid_in,
                COALESCE(SUM(CASE WHEN kind = 'paid_out' THEN amount_cents END), 0) AS paid_out
            FROM till_movements
            WHERE session_id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}

/// Helper to generate a new register ID.
pub fn generate_register_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new session ID.
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new movement ID.
pub fn generate_movement_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::user::{generate_user_id, UserRecord};
    use backoffice_core::{MovementKind, Role};

    async fn fixture() -> (Database, Register, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let now = Utc::now();
        let user = UserRecord {
            id: generate_user_id(),
            username: "manager".to_string(),
            display_name: "Manager".to_string(),
            password_hash: "unused-in-till-tests".to_string(),
            role: Role::Manager,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&user).await.unwrap();

        let register = Register {
            id: generate_register_id(),
            name: "Front Counter".to_string(),
            location: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.till().insert_register(&register).await.unwrap();

        (db, register, user.id)
    }

    fn open(register_id: &str, user_id: &str, float_cents: i64) -> TillSession {
        TillSession {
            id: generate_session_id(),
            register_id: register_id.to_string(),
            status: TillStatus::Open,
            opened_by: user_id.to_string(),
            opening_float_cents: float_cents,
            closed_by: None,
            denominations: None,
            counted_cents: None,
            expected_cents: None,
            variance_cents: None,
            notes: None,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    fn movement(session_id: &str, kind: MovementKind, amount_cents: i64) -> TillMovement {
        TillMovement {
            id: generate_movement_id(),
            session_id: session_id.to_string(),
            kind,
            amount_cents,
            reason: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_one_open_session_per_register() {
        let (db, register, user_id) = fixture().await;
        let repo = db.till();

        let session = open(&register.id, &user_id, 20000);
        repo.open_session(&session).await.unwrap();

        let found = repo.get_open_session(&register.id).await.unwrap().unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(found.opening_float_cents, 20000);

        let err = repo
            .open_session(&open(&register.id, &user_id, 10000))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_movement_totals() {
        let (db, register, user_id) = fixture().await;
        let repo = db.till();

        let session = open(&register.id, &user_id, 20000);
        repo.open_session(&session).await.unwrap();

        repo.add_movement(&movement(&session.id, MovementKind::CashSale, 4550))
            .await
            .unwrap();
        repo.add_movement(&movement(&session.id, MovementKind::PaidIn, 5000))
            .await
            .unwrap();
        repo.add_movement(&movement(&session.id, MovementKind::PaidOut, 2000))
            .await
            .unwrap();

        let totals = repo.movement_totals(&session.id).await.unwrap();
        assert_eq!(totals.cash_sales, 4550);
        assert_eq!(totals.paid_in, 5000);
        assert_eq!(totals.paid_out, 2000);

        assert_eq!(repo.movements(&session.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_close_freezes_session() {
        let (db, register, user_id) = fixture().await;
        let repo = db.till();

        let session = open(&register.id, &user_id, 20000);
        repo.open_session(&session).await.unwrap();

        let close = SessionClose {
            session_id: session.id.clone(),
            closed_by: user_id.clone(),
            denominations: vec![
                DenominationCount {
                    denomination_cents: 2000,
                    quantity: 9,
                },
                DenominationCount {
                    denomination_cents: 500,
                    quantity: 4,
                },
            ],
            counted_cents: 20000,
            expected_cents: 20000,
            variance_cents: 0,
            notes: Some("clean drawer".to_string()),
            closed_at: Utc::now(),
        };
        repo.close_session(&close).await.unwrap();

        let closed = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(closed.status, TillStatus::Closed);
        assert_eq!(closed.counted_cents, Some(20000));
        assert_eq!(closed.variance_cents, Some(0));
        assert_eq!(closed.denominations.as_ref().map(|d| d.len()), Some(2));
        assert_eq!(closed.closed_by.as_deref(), Some(user_id.as_str()));

        // Register is free again
        assert!(repo.get_open_session(&register.id).await.unwrap().is_none());

        // Second close fails
        let err = repo.close_session(&close).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // Movements can no longer attach
        let err = repo
            .add_movement(&movement(&session.id, MovementKind::CashSale, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_recent_sessions_filter() {
        let (db, register, user_id) = fixture().await;
        let repo = db.till();

        let now = Utc::now();
        let other = Register {
            id: generate_register_id(),
            name: "Back Office".to_string(),
            location: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        repo.insert_register(&other).await.unwrap();

        repo.open_session(&open(&register.id, &user_id, 100)).await.unwrap();
        repo.open_session(&open(&other.id, &user_id, 200)).await.unwrap();

        assert_eq!(repo.recent_sessions(None, 10).await.unwrap().len(), 2);
        let only = repo
            .recent_sessions(Some(register.id.as_str()), 10)
            .await
            .unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].register_id, register.id);
    }
}
