//! SQLite vault item repository implementation.
//!
//! The `sealed_password` column only ever receives a `SealedRecord`. Values are
//! loaded back unchecked, so a corrupt row still lists and only fails when it
//! is decrypted.

use lockbox_core::repository::vault_item::VaultItemRepository;
use lockbox_types::error::RepositoryError;
use lockbox_types::owner::OwnerId;
use lockbox_types::vault::{SealedRecord, VaultItem, VaultItemChanges, VaultItemId};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `VaultItemRepository`.
pub struct SqliteVaultItemRepository {
    pool: DatabasePool,
}

impl SqliteVaultItemRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn find_by_id(&self, id: &VaultItemId) -> Result<Option<VaultItem>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM vault_items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(query_error)?;

        row.as_ref().map(map_item).transpose()
    }
}

/// Internal row type for mapping SQLite rows to a domain `VaultItem`.
struct VaultItemRow {
    id: String,
    owner_id: String,
    title: String,
    username: String,
    sealed_password: String,
    url: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl VaultItemRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            username: row.try_get("username")?,
            sealed_password: row.try_get("sealed_password")?,
            url: row.try_get("url")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_item(self) -> Result<VaultItem, RepositoryError> {
        let id = self
            .id
            .parse::<VaultItemId>()
            .map_err(|e| RepositoryError::Query(format!("invalid vault item id: {e}")))?;

        let owner_id = self
            .owner_id
            .parse::<OwnerId>()
            .map_err(|e| RepositoryError::Query(format!("invalid owner id: {e}")))?;

        Ok(VaultItem {
            id,
            owner_id,
            title: self.title,
            username: self.username,
            sealed_password: SealedRecord::from_stored(self.sealed_password),
            url: self.url,
            notes: self.notes,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn map_item(row: &sqlx::sqlite::SqliteRow) -> Result<VaultItem, RepositoryError> {
    VaultItemRow::from_row(row).map_err(query_error)?.into_item()
}

impl VaultItemRepository for SqliteVaultItemRepository {
    async fn find_owned_by_id(
        &self,
        owner: &OwnerId,
        id: &VaultItemId,
    ) -> Result<Option<VaultItem>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM vault_items WHERE id = ? AND owner_id = ?")
            .bind(id.to_string())
            .bind(owner.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(map_item).transpose()
    }

    async fn insert(&self, item: &VaultItem) -> Result<VaultItem, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO vault_items (id, owner_id, title, username, sealed_password, url, notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(item.id.to_string())
        .bind(item.owner_id.to_string())
        .bind(&item.title)
        .bind(&item.username)
        .bind(item.sealed_password.as_str())
        .bind(&item.url)
        .bind(&item.notes)
        .bind(format_datetime(&item.created_at))
        .bind(format_datetime(&item.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(item.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("FOREIGN KEY") => {
                Err(RepositoryError::Conflict(format!(
                    "owner '{}' does not exist",
                    item.owner_id
                )))
            }
            Err(e) => Err(query_error(e)),
        }
    }

    async fn update_fields(
        &self,
        id: &VaultItemId,
        changes: &VaultItemChanges,
    ) -> Result<VaultItem, RepositoryError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE vault_items SET ");
        let mut sets = builder.separated(", ");

        if let Some(title) = &changes.title {
            sets.push("title = ").push_bind_unseparated(title.clone());
        }
        if let Some(username) = &changes.username {
            sets.push("username = ").push_bind_unseparated(username.clone());
        }
        if let Some(sealed) = &changes.sealed_password {
            sets.push("sealed_password = ")
                .push_bind_unseparated(sealed.as_str().to_string());
        }
        if let Some(url) = &changes.url {
            sets.push("url = ").push_bind_unseparated(url.clone());
        }
        if let Some(notes) = &changes.notes {
            sets.push("notes = ").push_bind_unseparated(notes.clone());
        }
        sets.push("updated_at = ")
            .push_bind_unseparated(format_datetime(&changes.updated_at));

        builder.push(" WHERE id = ").push_bind(id.to_string());

        let result = builder
            .build()
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        // Read back through the writer so the row reflects this update.
        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete_by_id(&self, id: &VaultItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM vault_items WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<VaultItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM vault_items WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter().map(map_item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::hash_api_key;
    use crate::sqlite::owner::SqliteOwnerRepository;
    use crate::sqlite::pool::database_url;
    use chrono::{Duration, Utc};
    use lockbox_core::repository::owner::OwnerRepository;
    use lockbox_types::owner::Owner;

    async fn test_pool() -> (tempfile::TempDir, DatabasePool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url(dir.path())).await.unwrap();
        (dir, pool)
    }

    async fn make_owner(pool: &DatabasePool, name: &str) -> OwnerId {
        let owner = Owner {
            id: OwnerId::new(),
            name: name.to_string(),
            api_key_hash: hash_api_key(name),
            created_at: Utc::now(),
        };
        SqliteOwnerRepository::new(pool.clone())
            .create(&owner)
            .await
            .unwrap();
        owner.id
    }

    fn make_item(owner: &OwnerId, title: &str, age_secs: i64) -> VaultItem {
        let created = Utc::now() - Duration::seconds(age_secs);
        VaultItem {
            id: VaultItemId::new(),
            owner_id: owner.clone(),
            title: title.to_string(),
            username: "octocat".to_string(),
            sealed_password: SealedRecord::from_parts("c2FsdA==", "cGF5bG9hZA==").unwrap(),
            url: Some("https://example.com".to_string()),
            notes: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_owned() {
        let (_dir, pool) = test_pool().await;
        let alice = make_owner(&pool, "alice").await;
        let bob = make_owner(&pool, "bob").await;
        let repo = SqliteVaultItemRepository::new(pool);

        let item = make_item(&alice, "GitHub", 0);
        repo.insert(&item).await.unwrap();

        let found = repo.find_owned_by_id(&alice, &item.id).await.unwrap().unwrap();
        assert_eq!(found.title, "GitHub");
        assert_eq!(found.sealed_password, item.sealed_password);
        assert_eq!(found.url.as_deref(), Some("https://example.com"));
        assert!(found.notes.is_none());
        assert_eq!(found.created_at, item.created_at);

        assert!(repo.find_owned_by_id(&bob, &item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_unknown_owner_conflicts() {
        let (_dir, pool) = test_pool().await;
        let repo = SqliteVaultItemRepository::new(pool);

        let err = repo.insert(&make_item(&OwnerId::new(), "Orphan", 0)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let (_dir, pool) = test_pool().await;
        let alice = make_owner(&pool, "alice").await;
        let bob = make_owner(&pool, "bob").await;
        let repo = SqliteVaultItemRepository::new(pool);

        repo.insert(&make_item(&alice, "oldest", 30)).await.unwrap();
        repo.insert(&make_item(&alice, "newest", 0)).await.unwrap();
        repo.insert(&make_item(&alice, "middle", 10)).await.unwrap();
        repo.insert(&make_item(&bob, "bobs", 5)).await.unwrap();

        let titles: Vec<String> = repo
            .list_by_owner(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["newest", "middle", "oldest"]);
        assert_eq!(repo.list_by_owner(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_fields_partial() {
        let (_dir, pool) = test_pool().await;
        let alice = make_owner(&pool, "alice").await;
        let repo = SqliteVaultItemRepository::new(pool);
        let item = make_item(&alice, "Old", 0);
        repo.insert(&item).await.unwrap();

        let new_record = SealedRecord::from_parts("bmV3c2FsdA==", "bmV3cGF5bG9hZA==").unwrap();
        let mut changes = VaultItemChanges::new(Utc::now() + Duration::seconds(1));
        changes.title = Some("New".to_string());
        changes.sealed_password = Some(new_record.clone());
        changes.url = Some(None);
        changes.notes = Some(Some("rotated".to_string()));

        let updated = repo.update_fields(&item.id, &changes).await.unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.username, "octocat");
        assert_eq!(updated.sealed_password, new_record);
        assert!(updated.url.is_none());
        assert_eq!(updated.notes.as_deref(), Some("rotated"));
        assert_eq!(updated.created_at, item.created_at);
        assert!(updated.updated_at > item.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (_dir, pool) = test_pool().await;
        let repo = SqliteVaultItemRepository::new(pool);

        let changes = VaultItemChanges::new(Utc::now());
        let err = repo
            .update_fields(&VaultItemId::new(), &changes)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let (_dir, pool) = test_pool().await;
        let alice = make_owner(&pool, "alice").await;
        let repo = SqliteVaultItemRepository::new(pool);
        let item = make_item(&alice, "Temp", 0);
        repo.insert(&item).await.unwrap();

        assert!(repo.delete_by_id(&item.id).await.unwrap());
        assert!(!repo.delete_by_id(&item.id).await.unwrap());
        assert!(repo.find_owned_by_id(&alice, &item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_delete_cascades() {
        let (_dir, pool) = test_pool().await;
        let alice = make_owner(&pool, "alice").await;
        let repo = SqliteVaultItemRepository::new(pool.clone());
        repo.insert(&make_item(&alice, "Cascade", 0)).await.unwrap();

        sqlx::query("DELETE FROM owners WHERE id = ?")
            .bind(alice.to_string())
            .execute(&pool.writer)
            .await
            .unwrap();

        assert!(repo.list_by_owner(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_sealed_password_stays_loadable() {
        let (_dir, pool) = test_pool().await;
        let alice = make_owner(&pool, "alice").await;
        let repo = SqliteVaultItemRepository::new(pool.clone());
        let healthy = make_item(&alice, "Healthy", 10);
        let corrupt = make_item(&alice, "Corrupt", 0);
        repo.insert(&healthy).await.unwrap();
        repo.insert(&corrupt).await.unwrap();

        sqlx::query("UPDATE vault_items SET sealed_password = 'no-colon-here' WHERE id = ?")
            .bind(corrupt.id.to_string())
            .execute(&pool.writer)
            .await
            .unwrap();

        let found = repo.find_owned_by_id(&alice, &corrupt.id).await.unwrap().unwrap();
        assert_eq!(found.sealed_password.as_str(), "no-colon-here");

        let titles: Vec<String> = repo
            .list_by_owner(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["Corrupt", "Healthy"]);
    }
}
