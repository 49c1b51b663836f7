//! Argon2id password hashing.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$digest`), so
//! everything needed to verify one travels with it. The configured cost is the
//! Argon2 time cost; raising it only affects new hashes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::HashError;

pub const MIN_COST: u32 = 1;
pub const MAX_COST: u32 = 16;

/// Longest password accepted for hashing, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 1024;

fn hasher(cost: u32) -> Result<Argon2<'static>, HashError> {
    if !(MIN_COST..=MAX_COST).contains(&cost) {
        return Err(HashError::CostOutOfRange(cost));
    }
    let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
        .map_err(|e| HashError::Backend(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash `password` with a fresh random salt.
pub fn hash(password: &str, cost: u32) -> Result<String, HashError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(HashError::PasswordTooLong);
    }
    let salt = SaltString::generate(&mut OsRng);
    hasher(cost)?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashError::Backend(e.to_string()))
}

/// Check `password` against a stored PHC hash.
///
/// Only a stored value that is not a PHC string at all is an error; every
/// other failure, including parameters this build cannot use, is `Ok(false)`.
pub fn verify(hash: &str, password: &str) -> Result<bool, HashError> {
    let parsed = PasswordHash::new(hash).map_err(|e| HashError::CorruptHash(e.to_string()))?;
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    // Parameters come from the hash itself, not from the default instance.
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash`] on the blocking pool. The work runs to completion even if the
/// returned future is dropped.
pub async fn hash_blocking(password: String, cost: u32) -> Result<String, HashError> {
    tokio::task::spawn_blocking(move || hash(&password, cost))
        .await
        .map_err(|e| HashError::Backend(e.to_string()))?
}

/// [`verify`] on the blocking pool.
pub async fn verify_blocking(hash: String, password: String) -> Result<bool, HashError> {
    tokio::task::spawn_blocking(move || verify(&hash, &password))
        .await
        .map_err(|e| HashError::Backend(e.to_string()))?
}
