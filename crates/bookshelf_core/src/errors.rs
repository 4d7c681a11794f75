use core::fmt;
use serde::Serialize;

/// The kinds of rows a lookup can fail to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Book,
    Quote,
    WishlistItem,
}

impl fmt::Display for Entity {
    #[allow(clippy::missing_inline_in_public_items, reason = "Only used in error messages")]
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::User => "user",
            Self::Book => "book",
            Self::Quote => "quote",
            Self::WishlistItem => "wishlist item",
        };
        formatter.write_str(name)
    }
}

/// A single rejected input field together with the message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    #[inline]
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_owned(),
            message: message.to_owned(),
        }
    }
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("resource belongs to another user")]
    Forbidden,

    #[error("invalid input: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("update request contains no fields")]
    EmptyUpdate,

    #[error("email address is already registered")]
    EmailTaken,

    #[error("insert did not return the new row")]
    InsertFailed,

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl LibraryError {
    /// Shorthand for a validation error on a single field
    #[must_use]
    #[inline]
    pub fn invalid(field: &str, message: &str) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}
