//! Vault item repository trait definition.

use lockbox_types::error::RepositoryError;
use lockbox_types::owner::OwnerId;
use lockbox_types::vault::{VaultItem, VaultItemChanges, VaultItemId};

/// Repository trait for vault item persistence.
///
/// Implementations only ever receive sealed passwords: `VaultItem` and
/// `VaultItemChanges` carry a `SealedRecord`, never plaintext.
pub trait VaultItemRepository: Send + Sync {
    /// Get an item by ID, but only if it belongs to `owner`.
    fn find_owned_by_id(
        &self,
        owner: &OwnerId,
        id: &VaultItemId,
    ) -> impl std::future::Future<Output = Result<Option<VaultItem>, RepositoryError>> + Send;

    /// Persist a new item. Returns the stored item.
    fn insert(
        &self,
        item: &VaultItem,
    ) -> impl std::future::Future<Output = Result<VaultItem, RepositoryError>> + Send;

    /// Apply field changes to an item. Returns the updated item, or
    /// `RepositoryError::NotFound` if it does not exist.
    fn update_fields(
        &self,
        id: &VaultItemId,
        changes: &VaultItemChanges,
    ) -> impl std::future::Future<Output = Result<VaultItem, RepositoryError>> + Send;

    /// Permanently delete an item. Returns whether a row was removed.
    fn delete_by_id(
        &self,
        id: &VaultItemId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// List all items of an owner, newest first.
    fn list_by_owner(
        &self,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<Vec<VaultItem>, RepositoryError>> + Send;
}
