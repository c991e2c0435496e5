//! # Database Handle
//!
//! Owns the SQLite connection pool and hands out typed repositories.
//!
//! ## Shape
//! ```text
//! DbConfig ──► Database::new ──► SqlitePool (WAL, FKs on)
//!                   │
//!                   ├── settings()   key/value overrides
//!                   ├── families()   product grouping
//!                   ├── products()   catalog + stock
//!                   ├── customers()  loyalty accounts + ledger
//!                   ├── till()       registers, sessions, movements
//!                   ├── bom()        base ↔ selling-unit links
//!                   └── users()      admin accounts
//! ```
//!
//! Repositories are constructed on demand around a clone of the pool, so a
//! single `Database` in shared state serves every request handler.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::bom::BomRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::family::FamilyRepository;
use crate::repository::product::ProductRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::till::TillRepository;
use crate::repository::user::UserRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Pool configuration, built with chained setters.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./backoffice.db").max_connections(8)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, created on first connect.
    pub database_path: PathBuf,

    /// Pool size cap. The default of 5 covers a single-store admin panel.
    pub max_connections: u32,

    /// Connections kept alive when idle.
    pub min_connections: u32,

    /// How long an acquire may wait before failing.
    pub connect_timeout: Duration,

    /// Idle time before a pooled connection is dropped.
    pub idle_timeout: Duration,

    /// Apply pending migrations during [`Database::new`]. Defaults to true;
    /// disable for tools that must inspect an old schema as-is.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration with defaults for the given database file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// In-memory database for tests. Single connection: every `:memory:`
    /// connection is its own database, so pooling would split the schema.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle over the pool; all repository access starts here.
///
/// Cloning is cheap (the pool is internally reference-counted), so the API
/// keeps one handle in shared state and hands clones to whoever needs them.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database file, builds the pool, and applies
    /// pending migrations unless the config disabled them.
    ///
    /// SQLite is tuned for a local admin workload: WAL journal so reads and
    /// writes don't block each other, NORMAL synchronous, and foreign keys
    /// switched on (SQLite leaves them off unless asked).
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening SQLite database"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("SQLite options set: WAL, NORMAL sync, foreign keys on");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations.
    ///
    /// `new()` already does this unless `run_migrations` was disabled in
    /// the config; it is exposed for that deferred case.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Applying schema migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Schema is current");
        Ok(())
    }

    /// Raw pool access, for the rare query no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Settings key/value repository.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Product family repository.
    pub fn families(&self) -> FamilyRepository {
        FamilyRepository::new(self.pool.clone())
    }

    /// Product catalog repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Customer and loyalty ledger repository.
    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// Register and till session repository.
    pub fn till(&self) -> TillRepository {
        TillRepository::new(self.pool.clone())
    }

    /// BOM link repository.
    pub fn bom(&self) -> BomRepository {
        BomRepository::new(self.pool.clone())
    }

    /// Admin user repository.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail after this; meant for
    /// application shutdown.
    pub async fn close(&self) {
        info!("Shutting down SQLite pool");
        self.pool.close().await;
    }

    /// True when the database still answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_comes_up_healthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_setters_chain() {
        let config = DbConfig::new("/tmp/admin.db")
            .max_connections(8)
            .min_connections(2);

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.min_connections, 2);
        assert!(config.run_migrations);
    }

    #[tokio::test]
    async fn test_migration_status_after_connect() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let (embedded, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert!(embedded >= 1);
        assert_eq!(embedded, applied);
    }

    #[tokio::test]
    async fn test_health_check_fails_after_close() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.close().await;
        assert!(!db.health_check().await);
    }
}
