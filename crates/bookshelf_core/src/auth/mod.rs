//! Credentials
//!
//! Signed session tokens and password hashes. Token verification never tells the caller why a
//! token was rejected, every failure collapses into [`AuthError::Unauthenticated`].
pub mod password;
pub mod token;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing or invalid credentials")]
    Unauthenticated,

    #[error("failed to sign token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}
