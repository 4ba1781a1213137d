//! Storage port for to do items
//!
//! The `TodoRepository` trait abstracts the concrete store so the domain
//! layer can run against SQLite in production and an in-memory map in tests
//! without modification.

use std::collections::HashMap;

use anyhow::anyhow;
use async_trait::async_trait;
use shared::TodoItem;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::DbConnection;

/// Errors surfaced by a repository implementation
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The targeted record changed or disappeared since it was last read
    #[error("to do item {id} was modified or removed since it was read")]
    Conflict { id: Uuid },
    /// Any other store-level failure
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Store(err.into())
    }
}

/// Trait defining the interface for to do item storage operations
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// List all items that have not been completed yet
    async fn list_active(&self) -> Result<Vec<TodoItem>, RepositoryError>;

    /// Retrieve a specific item by ID
    async fn get(&self, id: Uuid) -> Result<Option<TodoItem>, RepositoryError>;

    /// Persist a new item; returns whether a record was written
    async fn create(&self, item: &TodoItem) -> Result<bool, RepositoryError>;

    /// Persist changes to an existing item, keyed by its ID; returns whether
    /// a record changed. Fails with [`RepositoryError::Conflict`] when the
    /// record no longer matches what the caller read.
    async fn update(&self, item: &TodoItem) -> Result<bool, RepositoryError>;

    /// Remove the item for `id`; returns whether a record was removed.
    /// A dangling id is not an error, just `false`.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// SQLite-backed repository used in production
#[derive(Clone)]
pub struct SqliteTodoRepository {
    db: DbConnection,
}

impl SqliteTodoRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_item(row: &SqliteRow) -> Result<TodoItem, RepositoryError> {
        let id: String = row.get("id");
        let id = Uuid::parse_str(&id)
            .map_err(|e| RepositoryError::Store(anyhow!("invalid id in store: {e}")))?;

        Ok(TodoItem {
            id,
            description: row.get("description"),
            is_completed: row.get::<i64, _>("is_completed") != 0,
        })
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn list_active(&self) -> Result<Vec<TodoItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, description, is_completed FROM todo_items WHERE is_completed = 0",
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<TodoItem>, RepositoryError> {
        let row = sqlx::query("SELECT id, description, is_completed FROM todo_items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn create(&self, item: &TodoItem) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO todo_items (id, description, is_completed) VALUES (?, ?, ?)",
        )
        .bind(item.id.to_string())
        .bind(&item.description)
        .bind(item.is_completed as i64)
        .execute(self.db.pool())
        .await;

        match result {
            Ok(outcome) => Ok(outcome.rows_affected() > 0),
            // The partial unique index on active descriptions rejects a
            // racing duplicate; report it as an unwritten record rather
            // than a fault so the caller sees the same rejection shape.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, item: &TodoItem) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE todo_items SET description = ?, is_completed = ? WHERE id = ?",
        )
        .bind(&item.description)
        .bind(item.is_completed as i64)
        .bind(item.id.to_string())
        .execute(self.db.pool())
        .await?;

        // The guard matched nothing: the row vanished since it was read.
        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict { id: item.id });
        }

        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM todo_items WHERE id = ?")
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-memory repository used by unit tests
///
/// Mirrors the SQLite adapter's semantics, including the store-level
/// rejection of a duplicate active description on insert.
#[derive(Default)]
pub struct InMemoryTodoRepository {
    items: RwLock<HashMap<Uuid, TodoItem>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn list_active(&self) -> Result<Vec<TodoItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.values().filter(|item| !item.is_completed).cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<TodoItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.get(&id).cloned())
    }

    async fn create(&self, item: &TodoItem) -> Result<bool, RepositoryError> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Ok(false);
        }
        if !item.is_completed {
            let duplicate = items.values().any(|existing| {
                !existing.is_completed
                    && existing.description.eq_ignore_ascii_case(&item.description)
            });
            if duplicate {
                return Ok(false);
            }
        }
        items.insert(item.id, item.clone());
        Ok(true)
    }

    async fn update(&self, item: &TodoItem) -> Result<bool, RepositoryError> {
        let mut items = self.items.write().await;
        match items.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(true)
            }
            None => Err(RepositoryError::Conflict { id: item.id }),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut items = self.items.write().await;
        Ok(items.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(description: &str, is_completed: bool) -> TodoItem {
        TodoItem {
            id: Uuid::new_v4(),
            description: description.to_string(),
            is_completed,
        }
    }

    async fn sqlite_repository() -> SqliteTodoRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        SqliteTodoRepository::new(db)
    }

    #[tokio::test]
    async fn test_sqlite_create_and_get_roundtrip() {
        let repository = sqlite_repository().await;
        let new_item = item("Buy milk", false);

        let written = repository.create(&new_item).await.expect("create failed");
        assert!(written);

        let loaded = repository.get(new_item.id).await.expect("get failed");
        assert_eq!(loaded, Some(new_item));
    }

    #[tokio::test]
    async fn test_sqlite_list_active_excludes_completed_items() {
        let repository = sqlite_repository().await;
        let active = item("Buy milk", false);
        let completed = item("Walk the dog", true);

        repository.create(&active).await.expect("create failed");
        repository.create(&completed).await.expect("create failed");

        let listed = repository.list_active().await.expect("list failed");
        assert_eq!(listed, vec![active]);
    }

    #[tokio::test]
    async fn test_sqlite_create_rejects_duplicate_active_description() {
        let repository = sqlite_repository().await;
        repository.create(&item("Buy milk", false)).await.expect("create failed");

        let written = repository
            .create(&item("BUY MILK", false))
            .await
            .expect("second create should not be a fault");
        assert!(!written);
    }

    #[tokio::test]
    async fn test_sqlite_update_of_removed_item_is_a_conflict() {
        let repository = sqlite_repository().await;
        let stored = item("Buy milk", false);
        repository.create(&stored).await.expect("create failed");
        repository.delete(stored.id).await.expect("delete failed");

        let result = repository.update(&stored).await;
        assert!(matches!(result, Err(RepositoryError::Conflict { id }) if id == stored.id));
    }

    #[tokio::test]
    async fn test_sqlite_delete_of_dangling_id_returns_false() {
        let repository = sqlite_repository().await;

        let removed = repository.delete(Uuid::new_v4()).await.expect("delete failed");
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_in_memory_matches_sqlite_semantics() {
        let repository = InMemoryTodoRepository::new();
        let active = item("Buy milk", false);
        let completed = item("Walk the dog", true);

        assert!(repository.create(&active).await.unwrap());
        assert!(repository.create(&completed).await.unwrap());
        assert!(!repository.create(&item("buy milk", false)).await.unwrap());

        assert_eq!(repository.list_active().await.unwrap(), vec![active.clone()]);
        assert!(repository.delete(active.id).await.unwrap());
        assert!(!repository.delete(active.id).await.unwrap());

        let result = repository.update(&active).await;
        assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
    }
}
