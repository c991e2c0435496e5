//! # backoffice-db: Database Layer for Backoffice
//!
//! SQLite access for the admin API: one [`Database`] handle wrapping a sqlx
//! pool, a repository per table group, and embedded migrations.
//!
//! Nothing in here speaks HTTP. Handlers take a [`Database`] out of app
//! state, pick a repository, and get `backoffice-core` domain types back.
//!
//! ## Modules
//!
//! - [`pool`] - the [`Database`] handle, pool configuration, pragmas
//! - [`migrations`] - embedded schema migrations
//! - [`error`] - [`DbError`] and the SQLite error mapping
//! - [`repository`] - one repository per table group
//!
//! ## Usage
//!
//! ```rust,ignore
//! use backoffice_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/backoffice.db")).await?;
//! let families = db.families().list().await?;
//! let settings = db.settings().load().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::bom::BomRepository;
pub use repository::customer::CustomerRepository;
pub use repository::family::FamilyRepository;
pub use repository::product::ProductRepository;
pub use repository::settings::SettingsRepository;
pub use repository::till::TillRepository;
pub use repository::user::{UserRecord, UserRepository};
