//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! `VaultService` is generic over its repository and cipher, AppState pins it
//! to the SQLite repository and the PBKDF2/AES-GCM cipher.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use lockbox_core::repository::owner::OwnerRepository;
use lockbox_core::service::vault::VaultService;
use lockbox_infra::config::{load_vault_config, resolve_data_dir};
use lockbox_infra::crypto::cipher::VaultCipher;
use lockbox_infra::crypto::hash::{generate_api_key, hash_api_key};
use lockbox_infra::sqlite::owner::SqliteOwnerRepository;
use lockbox_infra::sqlite::pool::{DatabasePool, database_url};
use lockbox_infra::sqlite::vault_item::SqliteVaultItemRepository;
use lockbox_types::config::VaultConfig;
use lockbox_types::error::RepositoryError;
use lockbox_types::owner::{Owner, OwnerId};

/// Name of the owner the CLI acts as.
pub const LOCAL_OWNER: &str = "local";

pub type ConcreteVaultService = VaultService<SqliteVaultItemRepository, VaultCipher>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub vault_service: Arc<ConcreteVaultService>,
    pub owner_repo: Arc<SqliteOwnerRepository>,
    pub config: Arc<VaultConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, open the DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("cannot create data directory {}", data_dir.display()))?;

        let config = load_vault_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        Ok(Self::from_parts(db_pool, VaultCipher::new(), config, data_dir))
    }

    /// Wire services over an open pool.
    pub fn from_parts(
        db_pool: DatabasePool,
        cipher: VaultCipher,
        config: VaultConfig,
        data_dir: PathBuf,
    ) -> Self {
        let vault_service = VaultService::new(
            SqliteVaultItemRepository::new(db_pool.clone()),
            cipher,
            &config,
        );

        Self {
            vault_service: Arc::new(vault_service),
            owner_repo: Arc::new(SqliteOwnerRepository::new(db_pool)),
            config: Arc::new(config),
            data_dir,
        }
    }

    /// Create an owner with a fresh API key.
    ///
    /// Returns the owner and the plaintext key, which is not stored anywhere.
    pub async fn create_owner(&self, name: &str) -> anyhow::Result<(Owner, String)> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("owner name cannot be empty");
        }

        let api_key = generate_api_key();
        let owner = Owner {
            id: OwnerId::new(),
            name: name.to_string(),
            api_key_hash: hash_api_key(&api_key),
            created_at: chrono::Utc::now(),
        };

        let owner = self.owner_repo.create(&owner).await?;
        tracing::info!(owner_id = %owner.id, name = %owner.name, "owner created");
        Ok((owner, api_key))
    }

    /// The owner the CLI acts as, created on first use.
    pub async fn local_owner(&self) -> anyhow::Result<Owner> {
        if let Some(owner) = self.owner_repo.find_by_name(LOCAL_OWNER).await? {
            return Ok(owner);
        }

        match self.create_owner(LOCAL_OWNER).await {
            Ok((owner, _key)) => Ok(owner),
            // Lost a race with another process creating it.
            Err(e) if matches!(e.downcast_ref::<RepositoryError>(), Some(RepositoryError::Conflict(_))) => self
                .owner_repo
                .find_by_name(LOCAL_OWNER)
                .await?
                .context("local owner disappeared"),
            Err(e) => Err(e),
        }
    }
}
