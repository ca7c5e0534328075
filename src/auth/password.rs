//! Argon2id hashing, verification, and the password strength rule.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;

/// Characters counted as "special" by the strength rule.
const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Hash a password using Argon2id with optional custom params.
/// A random salt makes every call produce a distinct hash.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash. A malformed stored hash
/// reads as a mismatch, never an error.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// `hash_password` on the blocking pool. Argon2 is CPU-bound and would
/// stall the async runtime if run inline.
pub async fn hash_password_blocking(
    password: &str,
    config: Option<&SecurityConfig>,
) -> Result<String> {
    let password = password.to_string();
    let config = config.cloned();

    task::spawn_blocking(move || hash_password(&password, config.as_ref()))
        .await
        .context("Password hashing task panicked")?
}

/// `verify_password` on the blocking pool.
pub async fn verify_password_blocking(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();

    task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .context("Password verification task panicked")
}

/// Strength rule: at least 8 characters with one uppercase, one lowercase,
/// one digit, and one character from [`SPECIAL_CHARS`].
#[must_use]
pub fn is_strong_password(password: &str) -> bool {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIAL_CHARS.contains(c));
    let long_enough = password.len() >= 8;

    has_upper && has_lower && has_digit && has_special && long_enough
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_phc_and_salted() {
        let hash = hash_password("Test-Passw0rd", None).expect("should hash");
        assert!(hash.starts_with("$argon2"), "hash should be in PHC format");

        let second = hash_password("Test-Passw0rd", None).expect("should hash");
        assert_ne!(hash, second, "random salt should make hashes differ");
    }

    #[test]
    fn verify_matches_and_rejects() {
        let hash = hash_password("Correct-H0rse!", None).expect("should hash");

        assert!(verify_password("Correct-H0rse!", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn verify_tolerates_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn custom_params_produce_verifiable_hash() {
        let cfg = SecurityConfig::default();
        let hash = hash_password("Str0ng!enough", Some(&cfg)).expect("should hash");
        assert!(verify_password("Str0ng!enough", &hash));
    }

    #[test]
    fn strength_rule() {
        assert!(is_strong_password("Passw0rd!"));
        assert!(!is_strong_password("password"));
        assert!(!is_strong_password("PASSWORD1!"));
        assert!(!is_strong_password("Password!"));
        assert!(!is_strong_password("Password1"));
        assert!(!is_strong_password("Pa1!"));
    }
}
