//! Shared helpers for route and middleware tests.

use std::sync::Arc;

use chrono::Utc;

use backoffice_core::types::{Customer, Product, ProductFamily, Register, Role, User};
use backoffice_db::repository::customer::generate_customer_id;
use backoffice_db::repository::family::generate_family_id;
use backoffice_db::repository::product::generate_product_id;
use backoffice_db::repository::till::generate_register_id;
use backoffice_db::repository::user::generate_user_id;
use backoffice_db::{Database, DbConfig, UserRecord};

use crate::auth::{hash_password, Claims};
use crate::{AdminConfig, AppState};

/// Builds shared state over a fresh in-memory database.
pub async fn state() -> Arc<AppState> {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let config = AdminConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_path: ":memory:".to_string(),
        db_max_connections: 1,
        jwt_secret: "test-secret".to_string(),
        admin_password: None,
    };

    Arc::new(AppState::new(db, config))
}

/// Inserts an active user with the given role and returns it.
pub async fn seed_user(state: &AppState, username: &str, role: Role) -> User {
    let now = Utc::now();
    let record = UserRecord {
        id: generate_user_id(),
        username: username.to_string(),
        display_name: format!("Test {}", username),
        password_hash: hash_password("password-123").unwrap(),
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.users().insert(&record).await.unwrap();
    record.into_user()
}

/// Claims shaped the way the session gate inserts them.
pub fn claims_for(user: &User) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
        sub: user.id.clone(),
        name: user.display_name.clone(),
        role: user.role,
        iat: now,
        exp: now + 3600,
        jti: "test-jti".to_string(),
    }
}

/// Inserts an active family and returns it.
pub async fn seed_family(state: &AppState, name: &str) -> ProductFamily {
    let now = Utc::now();
    let family = ProductFamily {
        id: generate_family_id(),
        name: name.to_string(),
        description: None,
        display_order: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.families().insert(&family).await.unwrap()
}

/// Inserts an active product priced at $5.00 (cost $3.00) with 100 on hand.
pub async fn seed_product(state: &AppState, sku: &str, family_id: Option<&str>) -> Product {
    let now = Utc::now();
    let product = Product {
        id: generate_product_id(),
        sku: sku.to_string(),
        barcode: None,
        name: format!("Product {}", sku),
        description: None,
        family_id: family_id.map(|id| id.to_string()),
        price_cents: 500,
        cost_cents: 300,
        pack_quantity: 1,
        stock_on_hand: 100,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.products().insert(&product).await.unwrap()
}

/// Inserts an active customer with an empty loyalty balance.
pub async fn seed_customer(state: &AppState, name: &str, card: Option<&str>) -> Customer {
    let now = Utc::now();
    let customer = Customer {
        id: generate_customer_id(),
        name: name.to_string(),
        phone: Some("555-0100".to_string()),
        email: None,
        loyalty_card: card.map(|c| c.to_string()),
        points_balance: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.customers().insert(&customer).await.unwrap()
}

/// Inserts an active register and returns it.
pub async fn seed_register(state: &AppState, name: &str) -> Register {
    let now = Utc::now();
    let register = Register {
        id: generate_register_id(),
        name: name.to_string(),
        location: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.till().insert_register(&register).await.unwrap()
}
