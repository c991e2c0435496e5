//! # Settings Repository
//!
//! Database operations for the raw settings key/value table.
//!
//! ## Defaults Live in Code
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Settings Resolution                                 │
//! │                                                                         │
//! │  StoreSettings::default()          settings table                      │
//! │  (every key has a value)           (only overridden keys)              │
//! │       │                                 │                               │
//! │       └──────────────┬──────────────────┘                               │
//! │                      ▼                                                  │
//! │            StoreSettings::merge(rows)                                  │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │            Typed settings for handlers                                 │
//! │                                                                         │
//! │  A fresh database with zero rows is therefore fully configured.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use backoffice_core::settings::SettingRow;
use backoffice_core::StoreSettings;

/// Repository for settings rows.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Returns every stored settings row, sorted by key.
    ///
    /// Includes unknown keys written by other tools; those survive admin
    /// saves untouched.
    pub async fn all(&self) -> DbResult<Vec<SettingRow>> {
        let rows = sqlx::query_as::<_, SettingRow>(
            "SELECT key, value FROM settings ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Loads typed store settings: stored rows layered over defaults.
    pub async fn load(&self) -> DbResult<StoreSettings> {
        let rows = self.all().await?;

        Ok(StoreSettings::merge(
            rows.iter().map(|row| (row.key.as_str(), row.value.as_str())),
        ))
    }

    /// Upserts a batch of settings rows in one transaction.
    ///
    /// Values arrive pre-validated; this layer only persists them.
    pub async fn upsert_many(&self, rows: &[SettingRow]) -> DbResult<()> {
        debug!(count = rows.len(), "Upserting settings rows");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&row.key)
            .bind(&row.value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Removes one settings row, falling that key back to its default.
    pub async fn delete(&self, key: &str) -> DbResult<()> {
        debug!(key = %key, "Deleting settings row");

        sqlx::query("DELETE FROM settings WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn row(key: &str, value: &str) -> SettingRow {
        SettingRow {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_table_yields_defaults() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let settings = db.settings().load().await.unwrap();
        assert_eq!(settings, StoreSettings::default());
    }

    #[tokio::test]
    async fn test_upsert_and_load() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();

        repo.upsert_many(&[
            row("store.name", "Corner Shop"),
            row("currency.symbol", "€"),
            row("currency.decimals", "2"),
        ])
        .await
        .unwrap();

        let settings = repo.load().await.unwrap();
        assert_eq!(settings.store_name, "Corner Shop");
        assert_eq!(settings.currency.symbol, "€");

        // Second upsert overwrites
        repo.upsert_many(&[row("store.name", "Main Street Shop")])
            .await
            .unwrap();
        let settings = repo.load().await.unwrap();
        assert_eq!(settings.store_name, "Main Street Shop");
    }

    #[tokio::test]
    async fn test_unknown_keys_survive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();

        repo.upsert_many(&[row("terminal.sync_interval", "30")])
            .await
            .unwrap();

        let rows = repo.all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "terminal.sync_interval");

        // Unknown key does not disturb typed settings
        let settings = repo.load().await.unwrap();
        assert_eq!(settings, StoreSettings::default());
    }

    #[tokio::test]
    async fn test_delete_restores_default() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();

        repo.upsert_many(&[row("store.name", "Corner Shop")])
            .await
            .unwrap();
        repo.delete("store.name").await.unwrap();

        let settings = repo.load().await.unwrap();
        assert_eq!(settings.store_name, StoreSettings::default().store_name);
    }
}
