//! Password hashing for user accounts
//!
//! Passwords are stored as SHA-256 over `salt:password`, hex encoded, with a
//! per-user random salt. Pure functions only; account storage lives in the
//! server crate.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Generate a random 128-bit salt as 32 hex characters
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hash a password with the given salt
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a password attempt against a stored salt and hash
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let calculated = hash_password(password, salt);
    // Constant-time comparison
    calculated.len() == expected_hash.len()
        && calculated
            .bytes()
            .zip(expected_hash.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
