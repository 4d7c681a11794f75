use crate::auth::AuthError;

/// Hashes a password with bcrypt. This is CPU bound, async callers should run it on a blocking
/// thread.
/// # Errors
/// Fails if `cost` is outside the range bcrypt accepts.
#[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Compares a password against a stored bcrypt hash
/// # Errors
/// Fails if the stored hash is malformed.
#[allow(clippy::missing_inline_in_public_items, reason = "Called once per login")]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    Ok(bcrypt::verify(password, hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_roundtrip() {
        let hash = hash_password("hunter22", 4).unwrap();

        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("hunter22", "plain text").is_err());
    }
}
