//! # Schema Migrations
//!
//! Schema management for the Backoffice SQLite database.
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary by
//! [`sqlx::migrate!`], so a deployment is a single executable plus its
//! database file. On every connect, [`run_migrations`] compares the embedded
//! set against the `_sqlx_migrations` bookkeeping table and applies whatever
//! is pending, each file in its own transaction, in filename order.
//!
//! `001_initial_schema.sql` creates the whole admin surface: settings,
//! users, the product catalog (families, products), customers plus the
//! loyalty ledger, registers with till sessions and movements, and BOM
//! links. Later changes get a new `NNN_description.sql` file; applied files
//! are never edited, since their checksums are recorded.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies all pending migrations. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;

    info!(embedded = MIGRATOR.migrations.len(), "Migrations up to date");
    Ok(())
}

/// Returns (embedded, applied) migration counts for diagnostics.
///
/// A fresh file reports applied = 0 until [`run_migrations`] has created
/// the bookkeeping table.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((embedded, applied as usize))
}
