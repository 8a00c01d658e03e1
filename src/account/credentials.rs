//! Secret hashing for account credentials.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::warn;

use crate::error::{StorageError, StorageResult};

/// Well-formed hash with default Argon2id parameters that no secret is known
/// for. Checked against when the username is unknown so that path costs the
/// same as a wrong secret.
pub const UNKNOWN_ACCOUNT_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$PXZ58+vRrr9bcJFnYSkOQQ$5J0ABpDEIEdkxUPRaV+sx1KoStGoY6HQLlqh0KxV54M";

/// Hash a secret with Argon2id and a fresh salt
pub fn hash_secret(secret: &str) -> StorageResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StorageError::Backend(format!("failed to hash secret: {}", e)))
}

/// Check `secret` against a stored hash. A malformed hash never verifies.
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("qwerty").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_secret("qwerty", &hash));
        assert!(!verify_secret("qwerty1", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hash1 = hash_secret("qwerty").unwrap();
        let hash2 = hash_secret("qwerty").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_secret("qwerty", &hash1));
        assert!(verify_secret("qwerty", &hash2));
    }

    #[test]
    fn test_unknown_account_hash_uses_default_cost() {
        let parsed = PasswordHash::new(UNKNOWN_ACCOUNT_HASH).unwrap();
        let params = argon2::Params::try_from(&parsed).unwrap();

        assert_eq!(parsed.algorithm, argon2::Algorithm::Argon2id.ident());
        assert_eq!(params.m_cost(), argon2::Params::DEFAULT_M_COST);
        assert_eq!(params.t_cost(), argon2::Params::DEFAULT_T_COST);
        assert_eq!(params.p_cost(), argon2::Params::DEFAULT_P_COST);
        assert!(!verify_secret("qwerty", UNKNOWN_ACCOUNT_HASH));
        assert!(!verify_secret("", UNKNOWN_ACCOUNT_HASH));
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        assert!(!verify_secret("qwerty", "qwerty"));
        assert!(!verify_secret("", ""));
    }
}
