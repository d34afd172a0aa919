//! Vault configuration types.
//!
//! `VaultConfig` represents `config.toml` in the data directory. Every field
//! has a default, so an empty or partial file is valid.

use serde::{Deserialize, Serialize};

use crate::generator::DEFAULT_PASSWORD_LENGTH;

/// Top-level configuration for Lockbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// How long a revealed password stays on screen before it is wiped.
    pub reveal_ttl_secs: u64,

    /// Upper bound on key derivations running at the same time.
    pub max_concurrent_derivations: usize,

    /// Length used when a password is generated on create.
    pub default_password_length: usize,

    /// Minimum master password length accepted by the vault service.
    pub min_master_password_length: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            reveal_ttl_secs: 30,
            max_concurrent_derivations: 4,
            default_password_length: DEFAULT_PASSWORD_LENGTH,
            min_master_password_length: 8,
        }
    }
}
