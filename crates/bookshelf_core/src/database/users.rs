use crate::database::types::{UserId, UserProfile, UserRecord};
use crate::database::{Db, is_sqlite_unique_violation};
use crate::errors::LibraryError;

impl Db {
    /// Registers a user with an already hashed password
    /// # Errors
    /// Returns [`LibraryError::EmailTaken`] if another user has the same email.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn create_user(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> Result<UserProfile, LibraryError> {
        let result = sqlx::query_as::<_, UserProfile>(
            "INSERT INTO users (email, name, password)
            VALUES (?1, ?2, ?3)
            RETURNING id, email, name",
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(error) if is_sqlite_unique_violation(&error) => Err(LibraryError::EmailTaken),
            Err(error) => Err(LibraryError::Db(error)),
        }
    }

    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per login")]
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, LibraryError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, image, password FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Looks up the public profile of a user, e.g. to confirm that a token's subject still exists
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn user_profile(&self, id: UserId) -> Result<Option<UserProfile>, LibraryError> {
        let user = sqlx::query_as::<_, UserProfile>("SELECT id, email, name FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
