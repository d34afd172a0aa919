//! SecretCipher trait for sealing vault passwords.
//!
//! Defined in lockbox-core so the vault service can seal and open passwords
//! without coupling to a specific KDF or cipher. The `VaultCipher` adapter
//! lives in lockbox-infra.

use lockbox_types::error::CryptoError;
use lockbox_types::vault::SealedRecord;
use secrecy::SecretString;

/// Password-based sealing of secrets.
///
/// Every method is a pure function of its inputs plus fresh randomness, so a
/// single value can be shared across threads. `encrypt` and `decrypt` derive a
/// key from the master secret and are CPU-expensive; callers on an async
/// runtime should run them through `DerivationPool`.
pub trait SecretCipher: Send + Sync {
    /// Seal `plaintext` under a key derived from `master` and a fresh salt.
    fn encrypt(&self, plaintext: &str, master: &SecretString) -> Result<SealedRecord, CryptoError>;

    /// Open a record sealed by `encrypt` with the same master secret.
    fn decrypt(
        &self,
        record: &SealedRecord,
        master: &SecretString,
    ) -> Result<SecretString, CryptoError>;

    /// Random password containing at least one upper, lower, digit and symbol.
    fn generate_strong_password(&self, length: usize) -> Result<SecretString, CryptoError>;

    /// Seal and open a fixed string; true only on an exact round trip.
    fn test_encryption(&self, master: &SecretString) -> bool;
}
