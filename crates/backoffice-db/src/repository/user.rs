//! # User Repository
//!
//! Database operations for admin accounts.
//!
//! The password hash only exists on [`UserRecord`], which never leaves this
//! crate's callers' auth paths; everything user-facing works with the
//! hash-free [`User`] type.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use backoffice_core::{Role, User};

/// A users table row, including the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Strips the hash for API exposure.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            display_name: self.display_name,
            role: self.role,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for admin account operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a full record (with hash) by username. Login path only.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, display_name, password_hash, role,
                   is_active, created_at, updated_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Gets a user (no hash) by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, display_name, role, is_active, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists all accounts, active first, then by username.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, display_name, role, is_active, created_at, updated_at
            FROM users
            ORDER BY is_active DESC, username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Inserts a new account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username taken
    pub async fn insert(&self, record: &UserRecord) -> DbResult<()> {
        debug!(username = %record.username, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, display_name, password_hash, role,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&record.id)
        .bind(&record.username)
        .bind(&record.display_name)
        .bind(&record.password_hash)
        .bind(record.role)
        .bind(record.is_active)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces an account's password hash.
    pub async fn update_password(&self, id: &str, password_hash: &str) -> DbResult<()> {
        debug!(id = %id, "Updating user password");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?2,
                updated_at = ?3
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Deactivates an account. Tokens already issued expire on their own;
    /// the auth middleware rejects inactive users on every request.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating user");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = 0,
                updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Counts all accounts, active or not. Used by the bootstrap check.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new user ID.
pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn record(username: &str, role: Role) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: generate_user_id(),
            username: username.to_string(),
            display_name: username.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        assert_eq!(repo.count().await.unwrap(), 0);

        let admin = record("admin", Role::Admin);
        repo.insert(&admin).await.unwrap();

        let by_name = repo.get_by_username("admin").await.unwrap().unwrap();
        assert_eq!(by_name.role, Role::Admin);
        assert_eq!(by_name.password_hash, "$argon2id$stub");

        let by_id = repo.get_by_id(&admin.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "admin");

        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_username_unique() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&record("admin", Role::Admin)).await.unwrap();
        let err = repo.insert(&record("admin", Role::Clerk)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deactivate_keeps_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let clerk = record("clerk", Role::Clerk);
        repo.insert(&clerk).await.unwrap();
        repo.soft_delete(&clerk.id).await.unwrap();

        // Row survives for audit and the bootstrap check
        assert_eq!(repo.count().await.unwrap(), 1);
        let loaded = repo.get_by_id(&clerk.id).await.unwrap().unwrap();
        assert!(!loaded.is_active);

        // Password changes are refused once deactivated
        let err = repo.update_password(&clerk.id, "$new").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_orders_active_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let gone = record("alice", Role::Manager);
        repo.insert(&gone).await.unwrap();
        repo.insert(&record("bob", Role::Clerk)).await.unwrap();
        repo.soft_delete(&gone.id).await.unwrap();

        let users = repo.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "bob");
        assert_eq!(users[1].username, "alice");
    }
}
