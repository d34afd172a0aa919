//! Password-based AES-256-GCM sealing of vault secrets.
//!
//! Every `encrypt` draws a fresh 16-byte salt, derives a 256-bit key from the
//! master secret with PBKDF2-HMAC-SHA256, and seals the plaintext with
//! AES-256-GCM under a random 96-bit nonce.
//!
//! Record format: `base64(salt) ":" base64(nonce || ciphertext || tag)`
//!
//! Standard base64 never produces `:`, so the first colon always separates the
//! two fields. The iteration count is not part of the record.
//!
//! SECURITY: derived keys live in `Zeroizing` buffers and are wiped on drop.
//! Errors never carry plaintext, master secrets or key material.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lockbox_core::crypto::SecretCipher;
use lockbox_types::error::CryptoError;
use lockbox_types::vault::{SealedRecord, split_record};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use super::generator;

/// PBKDF2 work factor used for every record.
pub const KDF_ITERATIONS: u32 = 600_000;

/// Salt length in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce size (96 bits / 12 bytes).
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag size.
const TAG_LEN: usize = 16;

/// Known plaintext sealed and opened by `test_encryption`.
const SELF_TEST_PLAINTEXT: &str = "test-encryption";

/// Random, non-secret salt mixed into key derivation.
#[derive(Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a fresh salt from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// A salt decoded from a record must be exactly `SALT_LEN` bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SALT_LEN] = bytes.try_into().map_err(|_| CryptoError::MalformedRecord)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    fn encode(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", self.encode())
    }
}

/// 256-bit key derived from a master secret and a salt. Wiped on drop.
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Vault cipher with a fixed PBKDF2 iteration count.
///
/// A plain value with no interior state: share it freely across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultCipher {
    iterations: u32,
}

impl VaultCipher {
    /// Cipher using the production work factor.
    pub fn new() -> Self {
        Self::with_iterations(KDF_ITERATIONS)
    }

    /// Cipher with an explicit iteration count (at least 1).
    ///
    /// Records sealed under one count only open under the same count.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn derive_key(&self, master: &str, salt: &Salt) -> DerivedKey {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2::pbkdf2_hmac::<Sha256>(
            master.as_bytes(),
            salt.as_bytes(),
            self.iterations,
            key.as_mut_slice(),
        );
        DerivedKey(key)
    }

    /// Seal `plaintext` under a key derived from `master` and a fresh salt.
    pub fn seal(&self, plaintext: &str, master: &str) -> Result<SealedRecord, CryptoError> {
        let salt = Salt::generate();
        let key = self.derive_key(master, &salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| {
                CryptoError::InvalidConfiguration("plaintext too long to encrypt".to_string())
            })?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);

        SealedRecord::from_parts(&salt.encode(), &STANDARD.encode(&payload))
    }

    /// Open a raw `salt:payload` string.
    ///
    /// Shape and encoding problems are `MalformedRecord`; anything that fails
    /// after key derivation is `DecryptionFailed`, whatever the cause.
    pub fn open(&self, record: &str, master: &str) -> Result<SecretString, CryptoError> {
        let (salt_b64, payload_b64) = split_record(record)?;

        let salt_bytes = STANDARD
            .decode(salt_b64)
            .map_err(|_| CryptoError::MalformedRecord)?;
        let salt = Salt::from_slice(&salt_bytes)?;

        let payload = STANDARD
            .decode(payload_b64)
            .map_err(|_| CryptoError::MalformedRecord)?;
        if payload.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::MalformedRecord);
        }
        let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);

        let key = self.derive_key(master, &salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        match String::from_utf8(plaintext) {
            Ok(text) => Ok(SecretString::from(text)),
            Err(e) => {
                e.into_bytes().zeroize();
                Err(CryptoError::DecryptionFailed)
            }
        }
    }

    /// Seal and open a known string under `master`.
    pub fn self_test(&self, master: &str) -> bool {
        self.seal(SELF_TEST_PLAINTEXT, master)
            .and_then(|record| self.open(record.as_str(), master))
            .map(|opened| opened.expose_secret() == SELF_TEST_PLAINTEXT)
            .unwrap_or(false)
    }
}

impl Default for VaultCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretCipher for VaultCipher {
    fn encrypt(&self, plaintext: &str, master: &SecretString) -> Result<SealedRecord, CryptoError> {
        self.seal(plaintext, master.expose_secret())
    }

    fn decrypt(
        &self,
        record: &SealedRecord,
        master: &SecretString,
    ) -> Result<SecretString, CryptoError> {
        self.open(record.as_str(), master.expose_secret())
    }

    fn generate_strong_password(&self, length: usize) -> Result<SecretString, CryptoError> {
        generator::generate_strong_password(length).map(SecretString::from)
    }

    fn test_encryption(&self, master: &SecretString) -> bool {
        self.self_test(master.expose_secret())
    }
}

/// Derive a key with the production work factor.
pub fn derive_key(master: &str, salt: &Salt) -> DerivedKey {
    VaultCipher::new().derive_key(master, salt)
}

/// Seal `plaintext` with the production work factor.
pub fn encrypt(plaintext: &str, master: &str) -> Result<SealedRecord, CryptoError> {
    VaultCipher::new().seal(plaintext, master)
}

/// Open a record sealed with the production work factor.
pub fn decrypt(record: &str, master: &str) -> Result<SecretString, CryptoError> {
    VaultCipher::new().open(record, master)
}

pub fn test_encryption(master: &str) -> bool {
    VaultCipher::new().self_test(master)
}

pub fn generate_strong_password(length: usize) -> Result<SecretString, CryptoError> {
    generator::generate_strong_password(length).map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> VaultCipher {
        VaultCipher::with_iterations(1_000)
    }

    #[test]
    fn test_roundtrip_various_plaintexts() {
        let cipher = fast();
        let long = "x".repeat(4096);
        for plaintext in ["", "hunter2", "a:b:c", "pässwörd 🔑", long.as_str()] {
            let record = cipher.seal(plaintext, "master-secret").unwrap();
            let opened = cipher.open(record.as_str(), "master-secret").unwrap();
            assert_eq!(opened.expose_secret(), plaintext);
        }
    }

    #[test]
    fn test_wrong_master_fails() {
        let cipher = fast();
        let record = cipher.seal("secret data", "master-one").unwrap();
        let result = cipher.open(record.as_str(), "master-two");
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_fresh_salt_per_encryption() {
        let cipher = fast();
        let first = cipher.seal("same plaintext", "master").unwrap();
        let second = cipher.seal("same plaintext", "master").unwrap();

        assert_ne!(first.parts().0, second.parts().0);
        assert_ne!(first.parts().1, second.parts().1);

        assert_eq!(cipher.open(first.as_str(), "master").unwrap().expose_secret(), "same plaintext");
        assert_eq!(cipher.open(second.as_str(), "master").unwrap().expose_secret(), "same plaintext");
    }

    #[test]
    fn test_record_shape() {
        let record = fast().seal("value", "master").unwrap();
        let (salt, payload) = record.parts();

        assert_eq!(STANDARD.decode(salt).unwrap().len(), SALT_LEN);
        // nonce + 5 bytes of ciphertext + tag
        assert_eq!(STANDARD.decode(payload).unwrap().len(), NONCE_LEN + 5 + TAG_LEN);
        assert_eq!(record.as_str().matches(':').count(), 1);
    }

    #[test]
    fn test_malformed_records() {
        let cipher = fast();
        for raw in ["no-colon-here", ":", "abc:", ":abc"] {
            assert_eq!(
                cipher.open(raw, "master").unwrap_err(),
                CryptoError::MalformedRecord,
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_undecodable_fields_are_malformed() {
        let cipher = fast();
        let record = cipher.seal("value", "master").unwrap();
        let (salt, payload) = record.parts();

        // Not base64
        let bad_salt = format!("!!!!:{payload}");
        assert_eq!(cipher.open(&bad_salt, "master").unwrap_err(), CryptoError::MalformedRecord);

        // Valid base64, wrong salt length
        let short_salt = format!("{}:{payload}", STANDARD.encode([1u8; 8]));
        assert_eq!(cipher.open(&short_salt, "master").unwrap_err(), CryptoError::MalformedRecord);

        // Payload shorter than nonce + tag
        let short_payload = format!("{salt}:{}", STANDARD.encode([0u8; 10]));
        assert_eq!(cipher.open(&short_payload, "master").unwrap_err(), CryptoError::MalformedRecord);

        // Extra separator ends up in the payload and fails to decode
        let extra = format!("{salt}:{payload}:tail");
        assert_eq!(cipher.open(&extra, "master").unwrap_err(), CryptoError::MalformedRecord);
    }

    #[test]
    fn test_tampered_payload_fails_decryption() {
        let cipher = fast();
        let record = cipher.seal("value", "master").unwrap();
        let (salt, payload) = record.parts();

        let mut bytes = STANDARD.decode(payload).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = format!("{salt}:{}", STANDARD.encode(&bytes));

        assert_eq!(
            cipher.open(&tampered, "master").unwrap_err(),
            CryptoError::DecryptionFailed
        );
    }

    #[test]
    fn test_iteration_count_must_match() {
        let record = VaultCipher::with_iterations(1_000).seal("value", "master").unwrap();
        let result = VaultCipher::with_iterations(1_001).open(record.as_str(), "master");
        assert_eq!(result.unwrap_err(), CryptoError::DecryptionFailed);
    }

    #[test]
    fn test_derive_key_deterministic() {
        let cipher = fast();
        let salt = Salt::generate();
        let other_salt = Salt::generate();

        let a = cipher.derive_key("master", &salt);
        let b = cipher.derive_key("master", &salt);
        let c = cipher.derive_key("master", &other_salt);

        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn test_salt_from_slice_rejects_wrong_length() {
        assert!(Salt::from_slice(&[0u8; SALT_LEN]).is_ok());
        assert_eq!(Salt::from_slice(&[0u8; 15]), Err(CryptoError::MalformedRecord));
        assert_eq!(Salt::from_slice(&[0u8; 17]), Err(CryptoError::MalformedRecord));
    }

    #[test]
    fn test_debug_output_redacts_key() {
        let key = fast().derive_key("master", &Salt::generate());
        assert_eq!(format!("{key:?}"), "DerivedKey([REDACTED])");
    }

    #[test]
    fn test_self_test() {
        assert!(fast().self_test("master"));
    }

    #[test]
    fn test_with_iterations_clamps_zero() {
        assert_eq!(VaultCipher::with_iterations(0).iterations(), 1);
        assert_eq!(VaultCipher::new().iterations(), KDF_ITERATIONS);
    }

    #[test]
    fn test_secret_cipher_trait() {
        let cipher = fast();
        let master = SecretString::from("master");
        let record = SecretCipher::encrypt(&cipher, "via trait", &master).unwrap();
        let opened = SecretCipher::decrypt(&cipher, &record, &master).unwrap();
        assert_eq!(opened.expose_secret(), "via trait");
        assert!(SecretCipher::test_encryption(&cipher, &master));

        let generated = SecretCipher::generate_strong_password(&cipher, 24).unwrap();
        assert_eq!(generated.expose_secret().chars().count(), 24);
    }

    #[test]
    fn test_corrupt_stored_record_is_malformed() {
        let cipher = fast();
        let master = SecretString::from("master");
        for raw in ["no-colon-here", ":abc", "abc:", "%%%:%%%"] {
            let record = SealedRecord::from_stored(raw.to_string());
            assert!(matches!(
                SecretCipher::decrypt(&cipher, &record, &master),
                Err(CryptoError::MalformedRecord)
            ));
        }
    }

    #[test]
    fn test_error_messages_never_contain_secrets() {
        let cipher = fast();
        let record = cipher.seal("sk-super-secret-value", "myMasterPw123!").unwrap();
        let err = cipher.open(record.as_str(), "wrongPw").unwrap_err();
        let msg = format!("{err} {err:?}");
        assert!(!msg.contains("sk-super-secret-value"));
        assert!(!msg.contains("myMasterPw123!"));
        assert!(!msg.contains("wrongPw"));
        assert!(!msg.contains(record.parts().1));
    }

    // Production work factor; slower than the rest.
    #[test]
    fn test_scenario_production_iterations() {
        let record = encrypt("correct horse battery staple", "myMasterPw123!").unwrap();
        let opened = decrypt(record.as_str(), "myMasterPw123!").unwrap();
        assert_eq!(opened.expose_secret(), "correct horse battery staple");
        assert_eq!(
            decrypt(record.as_str(), "wrongPw").unwrap_err(),
            CryptoError::DecryptionFailed
        );
        assert!(test_encryption("myMasterPw123!"));
    }

    #[test]
    fn test_free_function_malformed() {
        assert_eq!(decrypt("no-colon-here", "m").unwrap_err(), CryptoError::MalformedRecord);
        assert_eq!(decrypt(":", "m").unwrap_err(), CryptoError::MalformedRecord);
        assert!(generate_strong_password(3).is_err());
        let salt = Salt::generate();
        assert_eq!(derive_key("m", &salt).as_bytes(), derive_key("m", &salt).as_bytes());
    }
}
