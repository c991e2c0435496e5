//! # Product Family Repository
//!
//! Database operations for product families.
//!
//! The list query joins each family with its active product count, which is
//! what the admin list page shows and what the delete guard checks.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use backoffice_core::{FamilyWithCount, ProductFamily};

/// Repository for product family operations.
#[derive(Debug, Clone)]
pub struct FamilyRepository {
    pool: SqlitePool,
}

impl FamilyRepository {
    /// Creates a new FamilyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FamilyRepository { pool }
    }

    /// Lists active families with their active product counts.
    ///
    /// Sorted by display_order, then name, matching the admin page order.
    pub async fn list(&self) -> DbResult<Vec<FamilyWithCount>> {
        let families = sqlx::query_as::<_, FamilyWithCount>(
            r#"
            SELECT
                f.id,
                f.name,
                f.description,
                f.display_order,
                f.is_active,
                f.created_at,
                f.updated_at,
                COALESCE(p.cnt, 0) AS product_count
            FROM product_families f
            LEFT JOIN (
                SELECT family_id, COUNT(*) AS cnt
                FROM products
                WHERE is_active = 1
                GROUP BY family_id
            ) p ON p.family_id = f.id
            WHERE f.is_active = 1
            ORDER BY f.display_order, f.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(families)
    }

    /// Gets a family by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<ProductFamily>> {
        let family = sqlx::query_as::<_, ProductFamily>(
            r#"
            SELECT id, name, description, display_order, is_active, created_at, updated_at
            FROM product_families
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(family)
    }

    /// Inserts a new family.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - an active family already has this name
    pub async fn insert(&self, family: &ProductFamily) -> DbResult<ProductFamily> {
        debug!(name = %family.name, "Inserting product family");

        sqlx::query(
            r#"
            INSERT INTO product_families (
                id, name, description, display_order, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&family.id)
        .bind(&family.name)
        .bind(&family.description)
        .bind(family.display_order)
        .bind(family.is_active)
        .bind(family.created_at)
        .bind(family.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(family.clone())
    }

    /// Updates a family's editable fields.
    pub async fn update(&self, family: &ProductFamily) -> DbResult<()> {
        debug!(id = %family.id, "Updating product family");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE product_families SET
                name = ?2,
                description = ?3,
                display_order = ?4,
                updated_at = ?5
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(&family.id)
        .bind(&family.name)
        .bind(&family.description)
        .bind(family.display_order)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product family", &family.id));
        }

        Ok(())
    }

    /// Counts active products assigned to a family.
    ///
    /// The delete guard: a family may only be removed when this is zero.
    pub async fn active_product_count(&self, family_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE family_id = ?1 AND is_active = 1",
        )
        .bind(family_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Soft-deletes a family.
    ///
    /// Callers must check [`Self::active_product_count`] first; this method
    /// only flips the flag.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product family");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE product_families
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
            return Err(DbError::not_found("Product family", id));
        }

        Ok(())
    }
}

/// Helper to generate a new family ID.
pub fn generate_family_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use backoffice_core::Product;

    fn sample(name: &str, order: i64) -> ProductFamily {
        let now = Utc::now();
        ProductFamily {
            id: generate_family_id(),
            name: name.to_string(),
            description: None,
            display_order: order,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn product_in(family_id: &str, sku: &str) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            sku: sku.to_string(),
            barcode: None,
            name: sku.to_string(),
            description: None,
            family_id: Some(family_id.to_string()),
            price_cents: 100,
            cost_cents: 60,
            pack_quantity: 1,
            stock_on_hand: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_with_counts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.families();

        let drinks = sample("Drinks", 1);
        let snacks = sample("Snacks", 2);
        repo.insert(&drinks).await.unwrap();
        repo.insert(&snacks).await.unwrap();

        db.products().insert(&product_in(&drinks.id, "COLA-330")).await.unwrap();
        db.products().insert(&product_in(&drinks.id, "COLA-500")).await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].family.name, "Drinks");
        assert_eq!(listed[0].product_count, 2);
        assert_eq!(listed[1].family.name, "Snacks");
        assert_eq!(listed[1].product_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_active_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.families();

        repo.insert(&sample("Drinks", 1)).await.unwrap();
        let err = repo.insert(&sample("Drinks", 2)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deleted_name_can_be_reused() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.families();

        let first = sample("Drinks", 1);
        repo.insert(&first).await.unwrap();
        repo.soft_delete(&first.id).await.unwrap();

        // Partial unique index only covers live rows
        repo.insert(&sample("Drinks", 1)).await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_active_product_count_guard() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.families();

        let family = sample("Drinks", 1);
        repo.insert(&family).await.unwrap();

        let product = product_in(&family.id, "COLA-330");
        db.products().insert(&product).await.unwrap();

        assert_eq!(repo.active_product_count(&family.id).await.unwrap(), 1);

        // Soft-deleting the product frees the family
        db.products().soft_delete(&product.id).await.unwrap();
        assert_eq!(repo.active_product_count(&family.id).await.unwrap(), 0);

        repo.soft_delete(&family.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_family() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.families();

        let ghost = sample("Ghost", 1);
        let err = repo.update(&ghost).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
