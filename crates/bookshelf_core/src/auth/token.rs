use crate::auth::AuthError;
use crate::database::types::UserId;
use chrono::{DateTime, Duration, Utc};
use core::fmt;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Tokens stay valid for a week, the same as the cookie carrying them
pub const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// The user id
    sub: UserId,
    iat: i64,
    exp: i64,
}

/// Issues and verifies HS256 tokens with a server-held secret
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl fmt::Debug for TokenKeys {
    #[allow(clippy::missing_inline_in_public_items, reason = "Debug output only")]
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TokenKeys")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    #[must_use]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once at startup")]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            lifetime: Duration::days(TOKEN_LIFETIME_DAYS),
        }
    }

    #[must_use]
    #[inline]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a token for `user_id` that starts its lifetime now
    /// # Errors
    /// Fails only if the claims cannot be signed.
    #[inline]
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token for `user_id` whose lifetime starts at `issued_at`
    /// # Errors
    /// Fails only if the claims cannot be signed.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per login")]
    pub fn issue_at(&self, user_id: UserId, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Checks signature and expiry and returns the user id the token was issued for
    /// # Errors
    /// Returns [`AuthError::Unauthenticated`] for any token that does not verify.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per request")]
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|error| {
                tracing::debug!("rejected token: {error}");
                AuthError::Unauthenticated
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_issued_token_verifies() {
        let keys = TokenKeys::new(b"secret");
        let token = keys.issue(42).unwrap();

        assert_eq!(keys.verify(&token).unwrap(), 42);
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let token = TokenKeys::new(b"other secret").issue(42).unwrap();

        assert!(matches!(
            TokenKeys::new(b"secret").verify(&token),
            Err(AuthError::Unauthenticated)
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let keys = TokenKeys::new(b"secret");
        let long_ago = Utc::now() - Duration::days(TOKEN_LIFETIME_DAYS + 1);
        let token = keys.issue_at(42, long_ago).unwrap();

        assert!(matches!(keys.verify(&token), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn test_rejects_garbage() {
        let keys = TokenKeys::new(b"secret");

        assert!(matches!(keys.verify(""), Err(AuthError::Unauthenticated)));
        assert!(matches!(
            keys.verify("not.a.token"),
            Err(AuthError::Unauthenticated)
        ));
    }
}
