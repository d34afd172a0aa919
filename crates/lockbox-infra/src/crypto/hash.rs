//! API key issuance and hashing.
//!
//! Only the SHA-256 hash of an API key is ever stored. The plaintext key is
//! shown to the user once, at creation.

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Prefix of every issued API key.
pub const API_KEY_PREFIX: &str = "lbx_";

/// Compute the SHA-256 hash of an API key (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

/// Generate a new random API key: `lbx_` followed by 64 hex characters.
pub fn generate_api_key() -> String {
    let mut key_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut key_bytes);
    format!(
        "{API_KEY_PREFIX}{}",
        key_bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    )
}
