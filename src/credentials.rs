use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{debug, warn};

use crate::models::User;
use crate::store::{Store, StoreError};

/// Argon2 failures. A wrong password is not one of them.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("could not hash password: {0}")]
    Hash(password_hash::Error),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(password_hash::Error),
    #[error("could not verify password: {0}")]
    Verify(password_hash::Error),
}

/// PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(PasswordError::Hash)?;
    Ok(hash.to_string())
}

pub fn verify_password(plain: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(PasswordError::MalformedHash)?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Verify(e)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthenticateError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Look up `email` and check `password` against its stored hash.
///
/// Unknown email and wrong password both come back as `None` so callers
/// cannot tell them apart.
pub async fn authenticate(
    store: &Store,
    email: &str,
    password: &str,
) -> Result<Option<User>, AuthenticateError> {
    let Some(user) = store.user_by_email(email).await? else {
        debug!("login for unknown email");
        return Ok(None);
    };

    let matches = verify_password(password, &user.password).inspect_err(|e| {
        warn!(user_id = user.id, error = %e, "stored password unusable");
    })?;
    if matches {
        Ok(Some(user))
    } else {
        debug!(user_id = user.id, "password mismatch");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("password").expect("hashing should succeed");
        assert_ne!(hash, "password");
        assert!(verify_password("password", &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("correct-horse").expect("hashing should succeed");
        assert!(!verify_password("wrong-horse", &hash).expect("verify should not error"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("pw").unwrap();
        let b = hash_password("pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, PasswordError::MalformedHash(_)));
        assert!(err.to_string().starts_with("stored password hash is malformed"));
    }
}
