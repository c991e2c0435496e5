//! # Database Errors
//!
//! Everything the repositories can fail with, folded into one enum.
//!
//! ## Constraint Mapping
//! ```text
//! SQLite constraint                      →  DbError variant
//!
//! UNIQUE products.sku                    →  UniqueViolation("sku")
//! UNIQUE idx_families_active_name        →  UniqueViolation("name")
//! UNIQUE idx_till_open_register          →  UniqueViolation(register_id)
//! FOREIGN KEY (any)                      →  ForeignKeyViolation
//! no matching row on a guarded UPDATE    →  NotFound (set by the repo)
//! ```
//!
//! The admin API layer translates these into HTTP statuses (404 / 409 / 400)
//! without inspecting SQLite messages itself.

use thiserror::Error;

/// Failure modes of the database layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row matched the requested id, or the row is soft-deleted and the
    /// query was scoped to live rows.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write. `field` names the offending
    /// column(s): duplicate SKU or username, a reused active family name,
    /// a second open session on one register.
    #[error("Duplicate {field}: another row already uses this value")]
    UniqueViolation { field: String },

    /// A write referenced a missing parent row (family, register, customer).
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The database file could not be opened or the pool has shut down.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An embedded migration failed to apply.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// The statement itself failed for a non-constraint reason.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Catch-all for decode failures and other conditions that indicate a
    /// bug rather than bad input (corrupt strategy columns, bad JSON in
    /// the denominations column).
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Shorthand the repositories use after a zero-row guarded write.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Reduces SQLite's "UNIQUE constraint failed: table.col, table.col2"
/// message to the bare column names the admin page knows.
fn unique_violation(message: &str) -> DbError {
    let columns = message
        .split("UNIQUE constraint failed: ")
        .nth(1)
        .unwrap_or("");

    let field = if columns.is_empty() {
        "unknown".to_string()
    } else {
        columns
            .split(", ")
            .map(|column| column.rsplit('.').next().unwrap_or(column))
            .collect::<Vec<_>>()
            .join(", ")
    };

    DbError::UniqueViolation { field }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if msg.contains("UNIQUE constraint failed") {
                    unique_violation(msg)
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Alias used by every repository signature.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
