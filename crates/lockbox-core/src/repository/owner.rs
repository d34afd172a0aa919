//! Owner repository trait definition.

use lockbox_types::error::RepositoryError;
use lockbox_types::owner::Owner;

/// Repository trait for owner accounts.
pub trait OwnerRepository: Send + Sync {
    /// Create a new owner. Fails with `Conflict` if the name is taken.
    fn create(
        &self,
        owner: &Owner,
    ) -> impl std::future::Future<Output = Result<Owner, RepositoryError>> + Send;

    /// Look up an owner by the SHA-256 hash of their API key.
    fn find_by_api_key_hash(
        &self,
        key_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<Owner>, RepositoryError>> + Send;

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Owner>, RepositoryError>> + Send;

    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Owner>, RepositoryError>> + Send;
}
