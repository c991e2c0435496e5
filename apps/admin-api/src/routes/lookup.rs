//! AJAX lookup endpoints.
//!
//! These back the typeahead widgets: short prefix queries, small result
//! sets, active records only. The loyalty endpoint additionally prices
//! the customer's point balance so the register can offer a redemption
//! amount without knowing the conversion rate.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use backoffice_core::types::{Customer, LoyaltyEntry, Product, TillSession};
use backoffice_core::validation::{clamp_search_limit, validate_search_query};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    #[serde(default)]
    pub register_id: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LoyaltyView {
    pub customer: Customer,
    pub points_balance: i64,

    /// What the balance is worth at checkout, in cents.
    pub redeem_value_cents: i64,

    /// Most recent ledger entries, newest first.
    pub entries: Vec<LoyaltyEntry>,
}

/// How many ledger entries the loyalty panel shows.
const LOYALTY_ENTRY_LIMIT: i64 = 10;

/// `GET /api/lookup/products?q=&limit=`
pub async fn lookup_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let q = validate_search_query(query.q.as_deref().unwrap_or(""))?;
    let limit = clamp_search_limit(query.limit);

    let products = state.db.products().search(&q, limit).await?;
    Ok(Json(products))
}

/// `GET /api/lookup/customers?q=&limit=`
pub async fn lookup_customers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    let q = validate_search_query(query.q.as_deref().unwrap_or(""))?;
    let limit = clamp_search_limit(query.limit);

    let customers = state.db.customers().search(&q, limit).await?;
    Ok(Json(customers))
}

/// `GET /api/customers/{id}/loyalty`
pub async fn customer_loyalty(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<LoyaltyView>> {
    let customer = state
        .db
        .customers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Customer not found: {}", id)))?;

    let settings = state.db.settings().load().await?;
    let entries = state
        .db
        .customers()
        .loyalty_entries(&id, LOYALTY_ENTRY_LIMIT)
        .await?;

    let points_balance = customer.points_balance;
    let redeem_value_cents = points_balance
        .max(0)
        .saturating_mul(settings.loyalty_redeem_value_cents);

    Ok(Json(LoyaltyView {
        customer,
        points_balance,
        redeem_value_cents,
        entries,
    }))
}

/// `GET /api/till/sessions?register_id=&limit=`
///
/// Recent sessions, newest first, optionally scoped to one register.
pub async fn till_sessions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionsQuery>,
) -> ApiResult<Json<Vec<TillSession>>> {
    let limit = clamp_search_limit(query.limit);
    let sessions = state
        .db
        .till()
        .recent_sessions(query.register_id.as_deref(), limit)
        .await?;

    Ok(Json(sessions))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;

    use backoffice_core::types::LoyaltyKind;
    use backoffice_db::repository::customer::generate_loyalty_entry_id;

    use crate::testutil;

    fn search(q: &str) -> Query<SearchQuery> {
        Query(SearchQuery {
            q: Some(q.to_string()),
            limit: None,
        })
    }

    #[tokio::test]
    async fn test_product_lookup_prefix_matches() {
        let state = testutil::state().await;
        testutil::seed_product(&state, "COLA-330", None).await;
        testutil::seed_product(&state, "CHIPS-50", None).await;

        let hits = lookup_products(State(state), search("COL")).await.unwrap();
        assert_eq!(hits.0.len(), 1);
        assert_eq!(hits.0[0].sku, "COLA-330");
    }

    #[tokio::test]
    async fn test_customer_lookup_finds_by_card() {
        let state = testutil::state().await;
        testutil::seed_customer(&state, "Asha K", Some("CARD-001")).await;
        testutil::seed_customer(&state, "Benny L", None).await;

        let hits = lookup_customers(State(state), search("CARD-0")).await.unwrap();
        assert_eq!(hits.0.len(), 1);
        assert_eq!(hits.0[0].name, "Asha K");
    }

    #[tokio::test]
    async fn test_overlong_query_rejected() {
        let state = testutil::state().await;

        let err = lookup_products(State(state), search(&"x".repeat(101)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_loyalty_view_prices_balance() {
        let state = testutil::state().await;
        let customer = testutil::seed_customer(&state, "Asha K", Some("CARD-001")).await;

        let entry = backoffice_core::types::LoyaltyEntry {
            id: generate_loyalty_entry_id(),
            customer_id: customer.id.clone(),
            kind: LoyaltyKind::Earn,
            points: 25,
            note: None,
            created_at: Utc::now(),
        };
        state.db.customers().append_loyalty(&entry).await.unwrap();

        // 5¢ per point makes the math visible.
        state
            .db
            .settings()
            .upsert_many(&[backoffice_core::settings::SettingRow {
                key: "loyalty.redeem_value_cents".to_string(),
                value: "5".to_string(),
            }])
            .await
            .unwrap();

        let view = customer_loyalty(State(state), Path(customer.id))
            .await
            .unwrap();
        assert_eq!(view.0.points_balance, 25);
        assert_eq!(view.0.redeem_value_cents, 125);
        assert_eq!(view.0.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_loyalty_unknown_customer_is_404() {
        let state = testutil::state().await;

        let err = customer_loyalty(State(state), Path("no-such-id".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sessions_scoped_to_register() {
        let state = testutil::state().await;
        let user = testutil::seed_user(&state, "manager", backoffice_core::types::Role::Manager).await;
        let front = testutil::seed_register(&state, "Front").await;
        let back = testutil::seed_register(&state, "Back").await;

        for register in [&front, &back] {
            let session = backoffice_core::types::TillSession {
                id: backoffice_db::repository::till::generate_session_id(),
                register_id: register.id.clone(),
                status: backoffice_core::types::TillStatus::Open,
                opened_by: user.id.clone(),
                opening_float_cents: 10_000,
                closed_by: None,
                denominations: None,
                counted_cents: None,
                expected_cents: None,
                variance_cents: None,
                notes: None,
                opened_at: Utc::now(),
                closed_at: None,
            };
            state.db.till().open_session(&session).await.unwrap();
        }

        let all = till_sessions(
            State(state.clone()),
            Query(SessionsQuery {
                register_id: None,
                limit: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(all.0.len(), 2);

        let scoped = till_sessions(
            State(state),
            Query(SessionsQuery {
                register_id: Some(front.id.clone()),
                limit: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(scoped.0.len(), 1);
        assert_eq!(scoped.0[0].register_id, front.id);
    }
}
