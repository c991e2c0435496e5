//! # BOM Link Repository
//!
//! Database operations for base/unit product links.
//!
//! The pricing strategy enum is stored flattened as (strategy_kind,
//! strategy_param) columns and reassembled on read, so the schema stays
//! plain INTEGER/TEXT and the enum stays in the core crate.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use backoffice_core::bom::PricingStrategy;
use backoffice_core::BomLink;

const LINK_COLUMNS: &str = "id, base_product_id, unit_product_id, unit_quantity, \
     strategy_kind, strategy_param, is_active, created_at, updated_at";

/// Raw bom_links row; decoded into [`BomLink`] via [`BomLinkRow::into_link`].
#[derive(Debug, sqlx::FromRow)]
struct BomLinkRow {
    id: String,
    base_product_id: String,
    unit_product_id: String,
    unit_quantity: i64,
    strategy_kind: String,
    strategy_param: Option<i64>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BomLinkRow {
    fn into_link(self) -> DbResult<BomLink> {
        let strategy = PricingStrategy::from_parts(&self.strategy_kind, self.strategy_param)
            .map_err(|e| {
                DbError::Internal(format!("bad strategy on bom link {}: {e}", self.id))
            })?;

        Ok(BomLink {
            id: self.id,
            base_product_id: self.base_product_id,
            unit_product_id: self.unit_product_id,
            unit_quantity: self.unit_quantity,
            strategy,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for BOM link operations.
#[derive(Debug, Clone)]
pub struct BomRepository {
    pool: SqlitePool,
}

impl BomRepository {
    /// Creates a new BomRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BomRepository { pool }
    }

    /// Lists active links whose base is the given product.
    pub async fn links_for_base(&self, base_product_id: &str) -> DbResult<Vec<BomLink>> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM bom_links \
             WHERE base_product_id = ?1 AND is_active = 1 \
             ORDER BY created_at"
        );

        let rows = sqlx::query_as::<_, BomLinkRow>(&sql)
            .bind(base_product_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(BomLinkRow::into_link).collect()
    }

    /// Gets the active link that derives the given selling unit, if any.
    ///
    /// The partial unique index guarantees at most one.
    pub async fn link_for_unit(&self, unit_product_id: &str) -> DbResult<Option<BomLink>> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM bom_links \
             WHERE unit_product_id = ?1 AND is_active = 1"
        );

        let row = sqlx::query_as::<_, BomLinkRow>(&sql)
            .bind(unit_product_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(BomLinkRow::into_link).transpose()
    }

    /// Gets a link by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<BomLink>> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM bom_links WHERE id = ?1");

        let row = sqlx::query_as::<_, BomLinkRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(BomLinkRow::into_link).transpose()
    }

    /// Inserts a new link.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the unit already has a live link
    /// * `Err(DbError::ForeignKeyViolation)` - base or unit product missing
    pub async fn insert(&self, link: &BomLink) -> DbResult<BomLink> {
        debug!(
            base = %link.base_product_id,
            unit = %link.unit_product_id,
            "Inserting BOM link"
        );

        let (kind, param) = link.strategy.as_parts();

        sqlx::query(
            r#"
            INSERT INTO bom_links (
                id, base_product_id, unit_product_id, unit_quantity,
                strategy_kind, strategy_param, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&link.id)
        .bind(&link.base_product_id)
        .bind(&link.unit_product_id)
        .bind(link.unit_quantity)
        .bind(kind)
        .bind(param)
        .bind(link.is_active)
        .bind(link.created_at)
        .bind(link.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(link.clone())
    }

    /// Updates a link's quantity and strategy.
    pub async fn update(&self, link: &BomLink) -> DbResult<()> {
        debug!(id = %link.id, "Updating BOM link");

        let now = Utc::now();
        let (kind, param) = link.strategy.as_parts();

        let result = sqlx::query(
            r#"
            UPDATE bom_links SET
                unit_quantity = ?2,
                strategy_kind = ?3,
                strategy_param = ?4,
                updated_at = ?5
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(&link.id)
        .bind(link.unit_quantity)
        .bind(kind)
        .bind(param)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("BOM link", &link.id));
        }

        Ok(())
    }

    /// Soft-deletes a link, freeing the unit product for a new base.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting BOM link");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bom_links
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
            return Err(DbError::not_found("BOM link", id));
        }

        Ok(())
    }
}

/// Helper to generate a new BOM link ID.
pub fn generate_bom_link_id() -> String {
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

    fn product(sku: &str, pack_quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            sku: sku.to_string(),
            barcode: None,
            name: sku.to_string(),
            description: None,
            family_id: None,
            price_cents: 1440,
            cost_cents: 960,
            pack_quantity,
            stock_on_hand: 48,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn link(base_id: &str, unit_id: &str, strategy: PricingStrategy) -> BomLink {
        let now = Utc::now();
        BomLink {
            id: generate_bom_link_id(),
            base_product_id: base_id.to_string(),
            unit_product_id: unit_id.to_string(),
            unit_quantity: 1,
            strategy,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_strategy_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let base = product("CASE-24", 24);
        let unit = product("CAN-1", 1);
        db.products().insert(&base).await.unwrap();
        db.products().insert(&unit).await.unwrap();

        let repo = db.bom();
        let created = link(
            &base.id,
            &unit.id,
            PricingStrategy::CostMarkup { markup_bps: 2500 },
        );
        repo.insert(&created).await.unwrap();

        let loaded = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(
            loaded.strategy,
            PricingStrategy::CostMarkup { markup_bps: 2500 }
        );

        // Strategy edits survive the flattened columns too
        let mut edited = loaded;
        edited.strategy = PricingStrategy::RetailProRata;
        repo.update(&edited).await.unwrap();

        let reloaded = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.strategy, PricingStrategy::RetailProRata);
    }

    #[tokio::test]
    async fn test_unit_has_one_live_link() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let base_a = product("CASE-24", 24);
        let base_b = product("CASE-12", 12);
        let unit = product("CAN-1", 1);
        db.products().insert(&base_a).await.unwrap();
        db.products().insert(&base_b).await.unwrap();
        db.products().insert(&unit).await.unwrap();

        let repo = db.bom();
        let first = link(&base_a.id, &unit.id, PricingStrategy::RetailProRata);
        repo.insert(&first).await.unwrap();

        let err = repo
            .insert(&link(&base_b.id, &unit.id, PricingStrategy::RetailProRata))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Retiring the first link frees the unit
        repo.soft_delete(&first.id).await.unwrap();
        repo.insert(&link(&base_b.id, &unit.id, PricingStrategy::RetailProRata))
            .await
            .unwrap();

        let current = repo.link_for_unit(&unit.id).await.unwrap().unwrap();
        assert_eq!(current.base_product_id, base_b.id);
    }

    #[tokio::test]
    async fn test_links_for_base() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let base = product("CASE-24", 24);
        let can = product("CAN-1", 1);
        let six_pack = product("SIX-6", 1);
        db.products().insert(&base).await.unwrap();
        db.products().insert(&can).await.unwrap();
        db.products().insert(&six_pack).await.unwrap();

        let repo = db.bom();
        repo.insert(&link(&base.id, &can.id, PricingStrategy::RetailProRata))
            .await
            .unwrap();
        let mut six = link(
            &base.id,
            &six_pack.id,
            PricingStrategy::Fixed { price_cents: 400 },
        );
        six.unit_quantity = 6;
        repo.insert(&six).await.unwrap();

        let links = repo.links_for_base(&base.id).await.unwrap();
        assert_eq!(links.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_products_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bom();

        let err = repo
            .insert(&link("no-base", "no-unit", PricingStrategy::RetailProRata))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
