use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CryptoError;
use crate::owner::OwnerId;

use std::fmt;
use std::str::FromStr;

/// Separator between the salt and ciphertext fields of a sealed record.
pub const RECORD_SEPARATOR: char = ':';

/// What outer surfaces show in place of a stored password.
pub const PASSWORD_MASK: &str = "••••••••";

/// Unique identifier for a vault item, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultItemId(pub Uuid);

impl VaultItemId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for VaultItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VaultItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VaultItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The persisted ciphertext of one secret: `<salt-encoded>:<ciphertext-encoded>`.
///
/// Records built with `from_parts` or parsed always have two non-empty,
/// colon-free fields. Records loaded with `from_stored` are taken as-is, so
/// their shape, like whether the fields decode, is only checked when the
/// record is decrypted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SealedRecord(String);

impl SealedRecord {
    /// Join an encoded salt and an encoded payload into a record.
    pub fn from_parts(salt: &str, payload: &str) -> Result<Self, CryptoError> {
        if salt.is_empty()
            || payload.is_empty()
            || salt.contains(RECORD_SEPARATOR)
            || payload.contains(RECORD_SEPARATOR)
        {
            return Err(CryptoError::MalformedRecord);
        }
        Ok(Self(format!("{salt}{RECORD_SEPARATOR}{payload}")))
    }

    /// Wrap a value read back from storage without checking its shape.
    ///
    /// A corrupt row stays loadable; decrypting it fails with `MalformedRecord`.
    pub fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    /// The encoded salt and payload fields. A stored record without a
    /// separator yields an empty payload.
    pub fn parts(&self) -> (&str, &str) {
        self.0
            .split_once(RECORD_SEPARATOR)
            .unwrap_or((self.0.as_str(), ""))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Split a raw record on its first separator.
///
/// Fails with `MalformedRecord` unless both sides are non-empty. Anything after
/// the first separator belongs to the payload, so `a:b:c` yields `("a", "b:c")`
/// and is rejected later when the payload fails to decode.
pub fn split_record(raw: &str) -> Result<(&str, &str), CryptoError> {
    match raw.split_once(RECORD_SEPARATOR) {
        Some((salt, payload)) if !salt.is_empty() && !payload.is_empty() => Ok((salt, payload)),
        _ => Err(CryptoError::MalformedRecord),
    }
}

impl FromStr for SealedRecord {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (salt, payload) = split_record(s)?;
        Self::from_parts(salt, payload)
    }
}

impl TryFrom<String> for SealedRecord {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SealedRecord> for String {
    fn from(record: SealedRecord) -> Self {
        record.0
    }
}

impl fmt::Debug for SealedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SealedRecord({} bytes)", self.0.len())
    }
}

/// A stored credential owned by exactly one owner.
///
/// The password only ever exists here in sealed form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultItem {
    pub id: VaultItemId,
    /// Immutable after creation.
    pub owner_id: OwnerId,
    pub title: String,
    pub username: String,
    pub sealed_password: SealedRecord,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a vault item.
///
/// When `password` is absent a strong password is generated and stored.
#[derive(Debug, Deserialize)]
pub struct CreateVaultItemRequest {
    pub title: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to update a vault item. Absent fields are left untouched; an empty
/// `url` or `notes` clears the field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateVaultItemRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateVaultItemRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.url.is_none()
            && self.notes.is_none()
    }
}

/// Field changes handed to persistence. The password can only travel sealed.
#[derive(Debug, Clone)]
pub struct VaultItemChanges {
    pub title: Option<String>,
    pub username: Option<String>,
    pub sealed_password: Option<SealedRecord>,
    /// `Some(None)` clears the stored value.
    pub url: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl VaultItemChanges {
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            title: None,
            username: None,
            sealed_password: None,
            url: None,
            notes: None,
            updated_at,
        }
    }

    /// Apply these changes to an in-memory item.
    pub fn apply_to(&self, item: &mut VaultItem) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(username) = &self.username {
            item.username = username.clone();
        }
        if let Some(sealed) = &self.sealed_password {
            item.sealed_password = sealed.clone();
        }
        if let Some(url) = &self.url {
            item.url = url.clone();
        }
        if let Some(notes) = &self.notes {
            item.notes = notes.clone();
        }
        item.updated_at = self.updated_at;
    }
}

/// Outward-facing view of a vault item with the password masked.
#[derive(Debug, Clone, Serialize)]
pub struct VaultItemView {
    pub id: VaultItemId,
    pub title: String,
    pub username: String,
    pub password: &'static str,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&VaultItem> for VaultItemView {
    fn from(item: &VaultItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            username: item.username.clone(),
            password: PASSWORD_MASK,
            url: item.url.clone(),
            notes: item.notes.clone(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}
