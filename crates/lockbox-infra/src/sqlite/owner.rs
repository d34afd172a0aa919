//! SQLite owner repository implementation.

use lockbox_core::repository::owner::OwnerRepository;
use lockbox_types::error::RepositoryError;
use lockbox_types::owner::{Owner, OwnerId};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `OwnerRepository`.
pub struct SqliteOwnerRepository {
    pool: DatabasePool,
}

impl SqliteOwnerRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct OwnerRow {
    id: String,
    name: String,
    api_key_hash: String,
    created_at: String,
}

impl OwnerRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            api_key_hash: row.try_get("api_key_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_owner(self) -> Result<Owner, RepositoryError> {
        let id = self
            .id
            .parse::<OwnerId>()
            .map_err(|e| RepositoryError::Query(format!("invalid owner id: {e}")))?;

        Ok(Owner {
            id,
            name: self.name,
            api_key_hash: self.api_key_hash,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn map_owner(row: &sqlx::sqlite::SqliteRow) -> Result<Owner, RepositoryError> {
    OwnerRow::from_row(row).map_err(query_error)?.into_owner()
}

impl OwnerRepository for SqliteOwnerRepository {
    async fn create(&self, owner: &Owner) -> Result<Owner, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO owners (id, name, api_key_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(owner.id.to_string())
        .bind(&owner.name)
        .bind(&owner.api_key_hash)
        .bind(format_datetime(&owner.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(owner.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(format!(
                    "owner '{}' already exists",
                    owner.name
                )))
            }
            Err(e) => Err(query_error(e)),
        }
    }

    async fn find_by_api_key_hash(&self, key_hash: &str) -> Result<Option<Owner>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM owners WHERE api_key_hash = ?")
            .bind(key_hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(map_owner).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Owner>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM owners WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(map_owner).transpose()
    }

    async fn list(&self) -> Result<Vec<Owner>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM owners ORDER BY name ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter().map(map_owner).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::hash_api_key;
    use crate::sqlite::pool::database_url;
    use chrono::Utc;

    async fn test_pool() -> (tempfile::TempDir, DatabasePool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url(dir.path())).await.unwrap();
        (dir, pool)
    }

    fn make_owner(name: &str) -> Owner {
        Owner {
            id: OwnerId::new(),
            name: name.to_string(),
            api_key_hash: hash_api_key(&format!("lbx_{name}")),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (_dir, pool) = test_pool().await;
        let repo = SqliteOwnerRepository::new(pool);
        let owner = make_owner("alice");

        repo.create(&owner).await.unwrap();

        let by_hash = repo
            .find_by_api_key_hash(&owner.api_key_hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_hash.id, owner.id);
        assert_eq!(by_hash.created_at, owner.created_at);

        let by_name = repo.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, owner.id);

        assert!(repo.find_by_name("bob").await.unwrap().is_none());
        assert!(repo.find_by_api_key_hash("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let (_dir, pool) = test_pool().await;
        let repo = SqliteOwnerRepository::new(pool);

        repo.create(&make_owner("alice")).await.unwrap();
        let mut dup = make_owner("alice");
        dup.api_key_hash = hash_api_key("another-key");

        let err = repo.create(&dup).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let (_dir, pool) = test_pool().await;
        let repo = SqliteOwnerRepository::new(pool);

        for name in ["carol", "alice", "bob"] {
            repo.create(&make_owner(name)).await.unwrap();
        }

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }
}
