use thiserror::Error;

/// Errors from the vault cipher and the credential generator.
///
/// IMPORTANT: these never carry plaintext, master secrets, key material or the
/// sealed record itself in their Display/Debug output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Caller supplied options that cannot produce a valid result.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The stored value is not a `salt:ciphertext` pair of decodable fields.
    #[error("malformed sealed record")]
    MalformedRecord,

    /// The ciphertext did not authenticate under the derived key.
    #[error("decryption failed")]
    DecryptionFailed,
}

/// Errors from repository operations (used by trait definitions in lockbox-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by the vault record lifecycle.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Item does not exist or belongs to another owner.
    #[error("vault item not found")]
    NotFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("storage error: {0}")]
    Storage(String),

    /// The operation was cancelled before key derivation started.
    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for VaultError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => VaultError::NotFound,
            other => VaultError::Storage(other.to_string()),
        }
    }
}
