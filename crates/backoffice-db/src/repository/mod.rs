//! # Repository Module
//!
//! One repository per table group. Each is a thin wrapper over the shared
//! `SqlitePool`: plain SQL in, `backoffice-core` domain types out,
//! [`DbError`](crate::DbError) on failure.
//!
//! Conventions shared across the modules:
//!
//! - the wider row shapes keep their SELECT list in a `*_COLUMNS` const
//! - writes set `updated_at` in the statement itself, there are no triggers
//! - catalog rows are soft-deleted by flipping `is_active`
//! - user-typed search text goes through `escape_like` before any LIKE
//!
//! ## Available Repositories
//!
//! - [`settings::SettingsRepository`] - Raw settings rows and typed merge
//! - [`family::FamilyRepository`] - Product family CRUD with product counts
//! - [`product::ProductRepository`] - Product CRUD, search, stock deltas
//! - [`customer::CustomerRepository`] - Customer lookups and loyalty ledger
//! - [`till::TillRepository`] - Registers, till sessions, cash movements
//! - [`bom::BomRepository`] - Base/unit product links
//! - [`user::UserRepository`] - Admin accounts

pub mod bom;
pub mod customer;
pub mod family;
pub mod product;
pub mod settings;
pub mod till;
pub mod user;

/// Escapes LIKE wildcards in user-supplied search text.
///
/// Callers build prefix patterns as `{escaped}%` and query with
/// `LIKE ?n ESCAPE '\'`, so a literal `%` or `_` typed by the user matches
/// itself instead of acting as a wildcard.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
