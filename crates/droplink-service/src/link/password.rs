//! Argon2id hashing for link passwords.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_entity::link::LinkConfig;

/// Hashes and verifies link passwords using Argon2id.
#[derive(Debug, Clone, Default)]
pub struct LinkPasswordHasher;

impl LinkPasswordHasher {
    /// Create a new hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext password with a random salt.
    pub fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored hash.
    ///
    /// Returns `Ok(true)` on a match, `Ok(false)` on a mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        let argon2 = Argon2::default();
        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

/// Gate a password attempt against a link's configuration.
///
/// Links without a password admit any attempt; protected links require
/// a matching one before any batch is opened through them.
pub fn admit_attempt(
    hasher: &LinkPasswordHasher,
    config: &LinkConfig,
    attempt: Option<&str>,
) -> AppResult<()> {
    let Some(hash) = config.password_hash.as_deref() else {
        return Ok(());
    };
    let attempt = attempt.ok_or_else(|| AppError::forbidden("This link is password protected"))?;
    if !hasher.verify(attempt, hash)? {
        return Err(AppError::forbidden("Invalid link password"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use droplink_core::error::ErrorKind;

    #[test]
    fn test_protected_link_requires_matching_password() {
        let hasher = LinkPasswordHasher::new();
        let config = LinkConfig {
            password_hash: Some(hasher.hash("s3cret").unwrap()),
            ..Default::default()
        };

        admit_attempt(&hasher, &config, Some("s3cret")).unwrap();

        let err = admit_attempt(&hasher, &config, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        let err = admit_attempt(&hasher, &config, Some("wrong")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[test]
    fn test_open_link_admits_any_attempt() {
        let hasher = LinkPasswordHasher::new();
        let config = LinkConfig::default();

        admit_attempt(&hasher, &config, None).unwrap();
        admit_attempt(&hasher, &config, Some("anything")).unwrap();
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = LinkPasswordHasher::new();
        let hash = hasher.hash("s3cret").unwrap();

        assert!(hasher.verify("s3cret", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }
}
