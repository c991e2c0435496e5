//! # Backoffice Admin API
//!
//! HTTP JSON server for the back-office admin panel.
//!
//! ## Route Groups
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Admin API Routes                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/settings │  │ /api/families  │  │  /api/labels               ││
//! │  │                │  │ /api/products  │  │                            ││
//! │  │ • Get (typed + │  │                │  │ • Build shelf label sheets ││
//! │  │   raw rows)    │  │ • CRUD         │  │   (EAN-13 normalization,   ││
//! │  │ • Partial save │  │ • Guarded      │  │   formatted prices)        ││
//! │  │                │  │   delete       │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/lookup   │  │  /api/till     │  │  /api/bom                  ││
//! │  │                │  │ /api/registers │  │                            ││
//! │  │ • Products     │  │                │  │ • Link CRUD                ││
//! │  │ • Customers    │  │ • Open / move- │  │ • Selling-unit quotes      ││
//! │  │ • Loyalty      │  │   ments / close│  │ • Base stock checks        ││
//! │  │ • Sessions     │  │ • Reconcile    │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Session Gate                                 │  │
//! │  │                                                                   │  │
//! │  │  Authorization: Bearer <jwt>  ──►  session check (401)            │  │
//! │  │                                         │                         │  │
//! │  │                                         ▼                         │  │
//! │  │                                 permission check (403)            │  │
//! │  │                                         │                         │  │
//! │  │                                         ▼                         │  │
//! │  │                                      handler                      │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `BACKOFFICE_BIND_ADDR` - Listen address (default: 127.0.0.1:8470)
//! - `BACKOFFICE_DATABASE_PATH` - SQLite file path (default: backoffice.db)
//! - `BACKOFFICE_JWT_SECRET` - Secret for session token signing
//! - `BACKOFFICE_ADMIN_PASSWORD` - Bootstrap admin password (first run)
//! - `BACKOFFICE_LOG` - Log filter (default: info)

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

#[cfg(test)]
mod testutil;

// Re-exports
pub use config::AdminConfig;
pub use error::{ApiError, ApiResult};

use backoffice_db::Database;

use crate::auth::SessionManager;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub sessions: SessionManager,
    pub config: AdminConfig,
}

impl AppState {
    /// Creates the shared state, deriving the session manager from config.
    pub fn new(db: Database, config: AdminConfig) -> Self {
        let sessions = SessionManager::new(config.jwt_secret.clone());
        AppState {
            db,
            sessions,
            config,
        }
    }
}
