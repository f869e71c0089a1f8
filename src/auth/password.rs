//! Argon2id password hashing.
//!
//! Hashing runs on the blocking pool so a burst of logins does not stall
//! the request executor.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::OnceLock;
use thiserror::Error;

/// Hash checked against when the account does not exist, so a miss costs
/// as much as a wrong password.
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

fn verify_blocking(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_blocking(&password)).await?
}

/// `false` for a wrong password and for a malformed stored hash alike.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hash = hash.to_string();
    Ok(tokio::task::spawn_blocking(move || verify_blocking(&password, &hash)).await?)
}

/// Run one verification against a throwaway hash. Always `false`.
pub async fn verify_dummy(password: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    Ok(tokio::task::spawn_blocking(move || {
        let hash = DUMMY_HASH
            .get_or_init(|| hash_blocking("docflow-no-such-user").unwrap_or_default());
        std::hint::black_box(verify_blocking(&password, hash));
        false
    })
    .await?)
}
