//! Database library
//!
//! The library exposes the `Db` struct and its methods to interact with the database through
//! pre-defined queries. Every query that touches user data is scoped by the caller's user id;
//! the only exceptions are the plain reads of a book or quote by id.
pub mod books;
pub mod conversion;
pub mod quotes;
pub mod stats;
pub mod types;
pub mod users;
pub mod wishlist;

use crate::errors::LibraryError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use core::str::FromStr as _;

#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Opens the database at `url`, creating the file if needed, and applies pending migrations
    /// # Errors
    /// Fails if the URL is malformed, the database cannot be opened or a migration fails.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once at start of program"
    )]
    pub async fn init(url: &str) -> Result<Self, LibraryError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;
        tracing::info!("connected to database at {url}");

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool and applies pending migrations
    /// # Errors
    /// Fails if a migration fails.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once at start of program"
    )]
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, LibraryError> {
        sqlx::migrate!().run(&pool).await?;
        Ok(Self { pool })
    }

    /// Private in-memory database with the schema applied. A single connection is kept open for
    /// the lifetime of the pool, since every new connection would see an empty database.
    /// # Errors
    /// Fails if the connection cannot be opened or a migration fails.
    #[allow(clippy::missing_inline_in_public_items, reason = "Used by tests")]
    pub async fn open_in_memory() -> Result<Self, LibraryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    #[must_use]
    #[inline]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once at end of program"
    )]
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Pure ownership check used by every mutation
pub(crate) fn ensure_owner(owner: types::UserId, caller: types::UserId) -> Result<(), LibraryError> {
    if owner == caller {
        Ok(())
    } else {
        Err(LibraryError::Forbidden)
    }
}

#[allow(
    clippy::pattern_type_mismatch,
    reason = "False positive, this is the idiomatic pattern"
)]
pub(crate) fn is_sqlite_unique_violation(error: &sqlx::Error) -> bool {
    // Check for unique violation by searching for matching text in error message
    if let sqlx::Error::Database(db_err) = error {
        db_err.message().contains("UNIQUE constraint failed")
    } else {
        false
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let db = test_support::db().await;
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        for table in ["accounts", "books", "quotes", "sessions", "users", "wishlist_items"] {
            assert!(tables.iter().any(|name| name == table), "missing {table}");
        }
    }

    #[test]
    fn test_ensure_owner() {
        assert!(ensure_owner(1, 1).is_ok());
        assert!(matches!(ensure_owner(1, 2), Err(LibraryError::Forbidden)));
    }
}
