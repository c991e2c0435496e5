//! # Customer Repository
//!
//! Database operations for customers and the loyalty ledger.
//!
//! ## Balance Denormalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Loyalty Ledger Pattern                               │
//! │                                                                         │
//! │  loyalty_ledger (append-only)          customers.points_balance        │
//! │  ┌──────────────────────────┐                                           │
//! │  │ earn   +25               │          running sum, updated in the     │
//! │  │ earn   +12               │  ───►    same transaction as each        │
//! │  │ redeem -30               │          ledger append                   │
//! │  │ adjust +5                │                                           │
//! │  └──────────────────────────┘          balance = 12                    │
//! │                                                                         │
//! │  Lookups read the balance column; audits read the ledger.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::escape_like;
use backoffice_core::{Customer, LoyaltyEntry};

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, loyalty_card, points_balance, \
     is_active, created_at, updated_at";

/// Repository for customer and loyalty operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Searches active customers by prefix across name, phone and card.
    ///
    /// An empty query returns the most recently touched customers, which is
    /// what the lookup widget shows before the clerk types anything.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Customer>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching customers");

        if query.is_empty() {
            let sql = format!(
                r#"
                SELECT {CUSTOMER_COLUMNS}
                FROM customers
                WHERE is_active = 1
                ORDER BY updated_at DESC
                LIMIT ?1
                "#
            );
            let customers = sqlx::query_as::<_, Customer>(&sql)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
            return Ok(customers);
        }

        let pattern = format!("{}%", escape_like(query));

        let sql = format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE is_active = 1
              AND (name LIKE ?1 ESCAPE '\'
                OR phone LIKE ?1 ESCAPE '\'
                OR loyalty_card LIKE ?1 ESCAPE '\')
            ORDER BY name
            LIMIT ?2
            "#
        );

        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = customers.len(), "Search returned customers");
        Ok(customers)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Gets a customer by loyalty card number.
    pub async fn get_by_card(&self, card: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE loyalty_card = ?1");

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(card)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Inserts a new customer.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - loyalty card already registered
    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        debug!(name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, email, loyalty_card, points_balance,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.loyalty_card)
        .bind(customer.points_balance)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer.clone())
    }

    /// Appends a loyalty ledger entry and moves the balance in one
    /// transaction.
    ///
    /// `entry.points` is a signed delta. Callers are responsible for sign
    /// conventions (redeems negative) and for rejecting over-redemption;
    /// this layer records what it is given.
    ///
    /// ## Returns
    /// The customer's new point balance.
    pub async fn append_loyalty(&self, entry: &LoyaltyEntry) -> DbResult<i64> {
        debug!(
            customer_id = %entry.customer_id,
            points = %entry.points,
            "Appending loyalty entry"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO loyalty_ledger (id, customer_id, kind, points, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.customer_id)
        .bind(entry.kind)
        .bind(entry.points)
        .bind(&entry.note)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET points_balance = points_balance + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&entry.customer_id)
        .bind(entry.points)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &entry.customer_id));
        }

        let balance: i64 =
            sqlx::query_scalar("SELECT points_balance FROM customers WHERE id = ?1")
                .bind(&entry.customer_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(balance)
    }

    /// Lists a customer's most recent ledger entries, newest first.
    pub async fn loyalty_entries(
        &self,
        customer_id: &str,
        limit: i64,
    ) -> DbResult<Vec<LoyaltyEntry>> {
        let entries = sqlx::query_as::<_, LoyaltyEntry>(
            r#"
            SELECT id, customer_id, kind, points, note, created_at
            FROM loyalty_ledger
            WHERE customer_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

/// Helper to generate a new customer ID.
pub fn generate_customer_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new ledger entry ID.
pub fn generate_loyalty_entry_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use backoffice_core::LoyaltyKind;
    use chrono::Utc;

    fn sample(name: &str, card: Option<&str>) -> Customer {
        let now = Utc::now();
        Customer {
            id: generate_customer_id(),
            name: name.to_string(),
            phone: Some("555-0100".to_string()),
            email: None,
            loyalty_card: card.map(|c| c.to_string()),
            points_balance: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn entry(customer_id: &str, kind: LoyaltyKind, points: i64) -> LoyaltyEntry {
        LoyaltyEntry {
            id: generate_loyalty_entry_id(),
            customer_id: customer_id.to_string(),
            kind,
            points,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_search_by_name_and_card() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.insert(&sample("Amira Khan", Some("LC-1001"))).await.unwrap();
        repo.insert(&sample("Asad Malik", Some("LC-2002"))).await.unwrap();
        repo.insert(&sample("Bela Torres", None)).await.unwrap();

        let by_name = repo.search("A", 20).await.unwrap();
        assert_eq!(by_name.len(), 2);

        let by_card = repo.search("LC-2", 20).await.unwrap();
        assert_eq!(by_card.len(), 1);
        assert_eq!(by_card[0].name, "Asad Malik");

        let all = repo.search("", 20).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_card_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.insert(&sample("Amira Khan", Some("LC-1001"))).await.unwrap();
        let err = repo
            .insert(&sample("Imposter", Some("LC-1001")))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Two cardless customers are fine (NULLs don't collide)
        repo.insert(&sample("Walk In", None)).await.unwrap();
        repo.insert(&sample("Other Walk In", None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_loyalty_ledger_moves_balance() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let customer = sample("Amira Khan", Some("LC-1001"));
        repo.insert(&customer).await.unwrap();

        let b1 = repo
            .append_loyalty(&entry(&customer.id, LoyaltyKind::Earn, 25))
            .await
            .unwrap();
        assert_eq!(b1, 25);

        let b2 = repo
            .append_loyalty(&entry(&customer.id, LoyaltyKind::Redeem, -10))
            .await
            .unwrap();
        assert_eq!(b2, 15);

        let loaded = repo.get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(loaded.points_balance, 15);

        let entries = repo.loyalty_entries(&customer.id, 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        // Newest first
        assert_eq!(entries[0].kind, LoyaltyKind::Redeem);
        assert_eq!(entries[1].kind, LoyaltyKind::Earn);
    }

    #[tokio::test]
    async fn test_loyalty_for_missing_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let err = repo
            .append_loyalty(&entry("missing-id", LoyaltyKind::Adjust, 5))
            .await
            .unwrap_err();
        // FK on the ledger row fires before the balance update runs
        assert!(matches!(
            err,
            DbError::ForeignKeyViolation { .. } | DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_get_by_card() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let customer = sample("Amira Khan", Some("LC-1001"));
        repo.insert(&customer).await.unwrap();

        let found = repo.get_by_card("LC-1001").await.unwrap().unwrap();
        assert_eq!(found.id, customer.id);
        assert!(repo.get_by_card("LC-9999").await.unwrap().is_none());
    }
}
