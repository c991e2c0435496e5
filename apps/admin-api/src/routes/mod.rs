//! # HTTP Route Table
//!
//! One place wires every endpoint to its handler and its permission, so
//! the whole access-control surface can be audited in a single screen.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ Group       Permission        Endpoints                                 │
//! │                                                                         │
//! │ (public)    -                 GET  /healthz                             │
//! │                               POST /api/auth/login                      │
//! │ settings    ManageSettings    GET/PUT /api/settings                     │
//! │ families    ManageFamilies    CRUD    /api/families[/:id]               │
//! │ products    ManageProducts    CRUD    /api/products[/:id]               │
//! │                               POST    /api/products/:id/stock           │
//! │ labels      PrintLabels       POST    /api/labels/sheet                 │
//! │ lookup      ViewLookups       GET     /api/lookup/{products,customers}  │
//! │                               GET     /api/customers/:id/loyalty        │
//! │                               GET     /api/till/sessions                │
//! │                               POST    /api/bom/check                    │
//! │ till        CloseTill         GET/POST /api/registers                   │
//! │                               POST    /api/till/open                    │
//! │                               POST    /api/till/:session_id/movements   │
//! │                               POST    /api/till/:session_id/close       │
//! │ bom         ManageBom         GET     /api/bom/:base_id/quotes          │
//! │                               POST    /api/bom/links                    │
//! │                               PUT/DELETE /api/bom/links/:id             │
//! │ users       ManageUsers       GET/POST /api/users                       │
//! │                               DELETE  /api/users/:id                    │
//! │                               PUT     /api/users/:id/password           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every protected group carries its permission gate; the session gate
//! wraps all of them at once, so it always runs first.

pub mod auth;
pub mod bom;
pub mod families;
pub mod labels;
pub mod lookup;
pub mod products;
pub mod settings;
pub mod till;
pub mod users;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use backoffice_core::types::Permission;

use crate::middleware::{permission_check, session_check};
use crate::AppState;

/// Assembles the full route table with both auth gates wired in.
pub fn build_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/auth/login", post(auth::login));

    let settings_group = Router::new().route(
        "/api/settings",
        get(settings::get_settings).put(settings::update_settings),
    );

    let family_group = Router::new()
        .route(
            "/api/families",
            get(families::list_families).post(families::create_family),
        )
        .route(
            "/api/families/:id",
            get(families::get_family)
                .put(families::update_family)
                .delete(families::delete_family),
        );

    let product_group = Router::new()
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/products/:id/stock", post(products::adjust_stock));

    let label_group = Router::new().route("/api/labels/sheet", post(labels::build_sheet));

    let lookup_group = Router::new()
        .route("/api/lookup/products", get(lookup::lookup_products))
        .route("/api/lookup/customers", get(lookup::lookup_customers))
        .route("/api/customers/:id/loyalty", get(lookup::customer_loyalty))
        .route("/api/till/sessions", get(lookup::till_sessions))
        .route("/api/bom/check", post(bom::check_availability));

    let till_group = Router::new()
        .route(
            "/api/registers",
            get(till::list_registers).post(till::create_register),
        )
        .route("/api/registers/:id", put(till::update_register))
        .route("/api/till/open", post(till::open_session))
        .route("/api/till/:session_id/movements", post(till::add_movement))
        .route("/api/till/:session_id/close", post(till::close_session));

    let bom_group = Router::new()
        .route("/api/bom/:base_id/quotes", get(bom::base_quotes))
        .route("/api/bom/links", post(bom::create_link))
        .route(
            "/api/bom/links/:id",
            put(bom::update_link).delete(bom::delete_link),
        );

    let user_group = Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/:id", delete(users::delete_user))
        .route("/api/users/:id/password", put(users::change_password));

    let protected = Router::new()
        .merge(guarded(settings_group, Permission::ManageSettings))
        .merge(guarded(family_group, Permission::ManageFamilies))
        .merge(guarded(product_group, Permission::ManageProducts))
        .merge(guarded(label_group, Permission::PrintLabels))
        .merge(guarded(lookup_group, Permission::ViewLookups))
        .merge(guarded(till_group, Permission::CloseTill))
        .merge(guarded(bom_group, Permission::ManageBom))
        .merge(guarded(user_group, Permission::ManageUsers))
        .layer(from_fn_with_state(state.clone(), session_check));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Wraps a route group with its permission gate.
fn guarded(routes: Router<Arc<AppState>>, permission: Permission) -> Router<Arc<AppState>> {
    routes.layer(from_fn_with_state(permission, permission_check))
}

/// `GET /healthz`
///
/// Liveness plus a database ping. Load balancers poll this.
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded" })),
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
