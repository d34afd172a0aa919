//! Vault item lifecycle service.
//!
//! Orchestrates creating, reading, updating, revealing and deleting vault items.
//! Passwords reach the repository only as `SealedRecord`s, reads never decrypt,
//! and the one decrypting path (`reveal_password`) requires the caller to
//! supply the master secret on every call.

use std::sync::Arc;

use lockbox_types::config::VaultConfig;
use lockbox_types::error::{CryptoError, VaultError};
use lockbox_types::owner::OwnerId;
use lockbox_types::vault::{
    CreateVaultItemRequest, SealedRecord, UpdateVaultItemRequest, VaultItem, VaultItemChanges,
    VaultItemId,
};
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;

use crate::crypto::SecretCipher;
use crate::repository::vault_item::VaultItemRepository;
use crate::service::pool::DerivationPool;

/// Service orchestrating the vault item lifecycle.
///
/// Generic over the repository and cipher traits -- lockbox-core never
/// depends on lockbox-infra. Holds no secret state: master secrets are taken
/// by value and dropped when the call returns.
pub struct VaultService<R: VaultItemRepository, C: SecretCipher + 'static> {
    repo: R,
    cipher: Arc<C>,
    pool: DerivationPool,
    shutdown: CancellationToken,
    default_password_length: usize,
    min_master_password_length: usize,
}

impl<R: VaultItemRepository, C: SecretCipher + 'static> VaultService<R, C> {
    pub fn new(repo: R, cipher: C, config: &VaultConfig) -> Self {
        Self {
            repo,
            cipher: Arc::new(cipher),
            pool: DerivationPool::new(config.max_concurrent_derivations),
            shutdown: CancellationToken::new(),
            default_password_length: config.default_password_length,
            min_master_password_length: config.min_master_password_length,
        }
    }

    /// Token that, once cancelled, rejects derivations still waiting for a worker.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Create a new item, sealing its password under `master`.
    ///
    /// Without a password in the request, a strong password of the configured
    /// default length is generated and stored.
    pub async fn create_item(
        &self,
        owner: &OwnerId,
        request: CreateVaultItemRequest,
        master: SecretString,
    ) -> Result<VaultItem, VaultError> {
        let title = required_field("title", &request.title)?;
        let username = required_field("username", &request.username)?;
        self.check_master_strength(&master)?;

        let password = match request.password {
            Some(password) => password,
            None => self
                .cipher
                .generate_strong_password(self.default_password_length)?,
        };

        let sealed_password = self.seal(password, master).await?;
        let now = chrono::Utc::now();

        let item = VaultItem {
            id: VaultItemId::new(),
            owner_id: owner.clone(),
            title,
            username,
            sealed_password,
            url: optional_field(request.url),
            notes: optional_field(request.notes),
            created_at: now,
            updated_at: now,
        };

        let item = self.repo.insert(&item).await?;
        tracing::info!(item_id = %item.id, owner_id = %owner, "vault item created");
        Ok(item)
    }

    /// Get an item owned by `owner`. The password stays sealed.
    pub async fn get_item(&self, owner: &OwnerId, id: &VaultItemId) -> Result<VaultItem, VaultError> {
        self.repo
            .find_owned_by_id(owner, id)
            .await?
            .ok_or(VaultError::NotFound)
    }

    /// List items owned by `owner`, newest first.
    ///
    /// A non-blank `search` keeps the items whose title, username or url
    /// contains it, ignoring case.
    pub async fn list_items(
        &self,
        owner: &OwnerId,
        search: Option<&str>,
    ) -> Result<Vec<VaultItem>, VaultError> {
        let items = self.repo.list_by_owner(owner).await?;
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        Ok(match needle {
            Some(needle) => items
                .into_iter()
                .filter(|item| matches_search(item, &needle))
                .collect(),
            None => items,
        })
    }

    /// Update an item's fields.
    ///
    /// A new password is re-sealed with a fresh salt and therefore needs the
    /// master secret; metadata-only updates do not.
    pub async fn update_item(
        &self,
        owner: &OwnerId,
        id: &VaultItemId,
        request: UpdateVaultItemRequest,
        master: Option<SecretString>,
    ) -> Result<VaultItem, VaultError> {
        let existing = self.get_item(owner, id).await?;

        let mut changes = VaultItemChanges::new(chrono::Utc::now());
        changes.title = request
            .title
            .as_deref()
            .map(|t| required_field("title", t))
            .transpose()?;
        changes.username = request
            .username
            .as_deref()
            .map(|u| required_field("username", u))
            .transpose()?;
        changes.url = request.url.map(|url| optional_field(Some(url)));
        changes.notes = request.notes.map(|notes| optional_field(Some(notes)));

        if let Some(password) = request.password {
            let master = master.ok_or_else(|| {
                VaultError::InvalidInput(
                    "master password is required to change the stored password".to_string(),
                )
            })?;
            self.check_master_strength(&master)?;
            changes.sealed_password = Some(self.seal(password, master).await?);
        }

        let updated = self.repo.update_fields(&existing.id, &changes).await?;
        tracing::info!(
            item_id = %updated.id,
            owner_id = %owner,
            password_changed = changes.sealed_password.is_some(),
            "vault item updated"
        );
        Ok(updated)
    }

    /// Permanently delete an item owned by `owner`.
    pub async fn delete_item(&self, owner: &OwnerId, id: &VaultItemId) -> Result<(), VaultError> {
        let existing = self.get_item(owner, id).await?;

        if !self.repo.delete_by_id(&existing.id).await? {
            return Err(VaultError::NotFound);
        }

        tracing::info!(item_id = %id, owner_id = %owner, "vault item deleted");
        Ok(())
    }

    /// Decrypt an item's password with the supplied master secret.
    ///
    /// The result is not cached anywhere; callers should drop it as soon as
    /// the response has been delivered. Cipher failures are returned as-is:
    /// retrying with the same inputs cannot succeed.
    pub async fn reveal_password(
        &self,
        owner: &OwnerId,
        id: &VaultItemId,
        master: SecretString,
    ) -> Result<SecretString, VaultError> {
        require_master(&master)?;
        let item = self.get_item(owner, id).await?;

        let cipher = Arc::clone(&self.cipher);
        let record = item.sealed_password;
        let result = self
            .pool
            .run(&self.shutdown, move || cipher.decrypt(&record, &master))
            .await?;

        match result {
            Ok(password) => {
                tracing::info!(item_id = %id, owner_id = %owner, "vault item revealed");
                Ok(password)
            }
            Err(e) => {
                tracing::warn!(item_id = %id, owner_id = %owner, error = %e, "vault item reveal failed");
                Err(e.into())
            }
        }
    }

    /// Round-trip self-test of the cipher under `master`.
    pub async fn verify_master(&self, master: SecretString) -> Result<bool, VaultError> {
        require_master(&master)?;
        let cipher = Arc::clone(&self.cipher);
        self.pool
            .run(&self.shutdown, move || cipher.test_encryption(&master))
            .await
    }

    /// Generate a strong password without storing it.
    pub fn generate_password(&self, length: Option<usize>) -> Result<SecretString, VaultError> {
        let length = length.unwrap_or(self.default_password_length);
        Ok(self.cipher.generate_strong_password(length)?)
    }

    async fn seal(
        &self,
        password: SecretString,
        master: SecretString,
    ) -> Result<SealedRecord, VaultError> {
        let cipher = Arc::clone(&self.cipher);
        let sealed: Result<SealedRecord, CryptoError> = self
            .pool
            .run(&self.shutdown, move || {
                cipher.encrypt(password.expose_secret(), &master)
            })
            .await?;
        Ok(sealed?)
    }

    fn check_master_strength(&self, master: &SecretString) -> Result<(), VaultError> {
        require_master(master)?;
        if master.expose_secret().chars().count() < self.min_master_password_length {
            return Err(VaultError::InvalidInput(format!(
                "master password must be at least {} characters",
                self.min_master_password_length
            )));
        }
        Ok(())
    }
}

fn require_master(master: &SecretString) -> Result<(), VaultError> {
    if master.expose_secret().is_empty() {
        return Err(VaultError::InvalidInput(
            "master password cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn required_field(name: &str, value: &str) -> Result<String, VaultError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(VaultError::InvalidInput(format!("{name} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn matches_search(item: &VaultItem, needle: &str) -> bool {
    [Some(item.title.as_str()), Some(item.username.as_str()), item.url.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

fn optional_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
