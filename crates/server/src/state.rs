use crate::config::Config;
use bookshelf_core::auth::token::TokenKeys;
use bookshelf_core::database::Db;

/// Shared by every handler. Cloning is cheap, the pool and keys are reference counted.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Db,
    pub keys: TokenKeys,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
}

impl AppState {
    #[must_use]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once at startup")]
    pub fn new(db: Db, config: &Config) -> Self {
        Self {
            db,
            keys: TokenKeys::new(config.jwt_secret.as_bytes()),
            cookie_secure: config.cookie_secure,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}
