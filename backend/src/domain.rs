//! Domain service for the to do item lifecycle
//!
//! `TodoService` owns validation, the active-description uniqueness rule and
//! the timing/logging instrumentation. It is stateless between calls; the
//! repository is the only thing it holds.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use shared::{CreateTodoItemRequest, TodoItem};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::repository::{RepositoryError, TodoRepository};

/// Outcomes the transport layer maps to status codes
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Description is required")]
    DescriptionRequired,
    #[error("Description already exists")]
    DuplicateDescription,
    #[error("Id in path does not match id in payload")]
    IdMismatch,
    #[error("To do item not found")]
    NotFound,
    #[error("The store did not confirm the write")]
    WriteRejected,
    /// Unexpected store fault, re-raised unchanged after logging
    #[error(transparent)]
    Store(anyhow::Error),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Store(e) => ServiceError::Store(e),
            conflict @ RepositoryError::Conflict { .. } => {
                ServiceError::Store(anyhow::Error::new(conflict))
            }
        }
    }
}

/// Wraps every service operation identically: start trace, wall-clock
/// timing, completion trace with the elapsed duration, and an error-level
/// entry for unexpected store faults before they are re-raised. Rejections
/// stay at info level. The result passes through untouched.
async fn instrumented<T, F>(operation: &'static str, fut: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    info!(operation, "Starting to do operation");
    let started = Instant::now();

    let result = fut.await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Err(ServiceError::Store(e)) => {
            error!(operation, error = ?e, "Something went wrong during to do operation");
        }
        Err(e) => info!(operation, rejection = %e, "To do operation rejected"),
        Ok(_) => {}
    }
    info!(operation, elapsed_ms, "To do operation completed");

    result
}

/// Service for managing the to do item lifecycle
#[derive(Clone)]
pub struct TodoService {
    repository: Arc<dyn TodoRepository>,
}

impl TodoService {
    /// Create a new TodoService over the given repository
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }

    /// List all items that have not been completed yet
    pub async fn list_active(&self) -> Result<Vec<TodoItem>, ServiceError> {
        instrumented("list_active", async {
            info!("Retrieving all active to do items");

            let items = self.repository.list_active().await?;

            info!("Found {} active to do items", items.len());
            Ok(items)
        })
        .await
    }

    /// Get a to do item by ID; an absent item is not an error
    pub async fn get(&self, id: Uuid) -> Result<Option<TodoItem>, ServiceError> {
        instrumented("get", async {
            info!("Retrieving to do item with id {}", id);

            Ok(self.repository.get(id).await?)
        })
        .await
    }

    /// Create a new to do item
    ///
    /// Validates the description, checks the uniqueness rule against the
    /// current active set and assigns a fresh id before writing. The check
    /// and the write are not atomic as a pair; the store-level unique index
    /// backstops the rule under race.
    pub async fn create(&self, request: CreateTodoItemRequest) -> Result<TodoItem, ServiceError> {
        instrumented("create", async {
            info!("Creating to do item with description: {}", request.description);

            if request.description.is_empty() {
                return Err(ServiceError::DescriptionRequired);
            }

            let active = self.repository.list_active().await?;
            let duplicate = active
                .iter()
                .any(|existing| existing.description.to_lowercase() == request.description.to_lowercase());
            if duplicate {
                return Err(ServiceError::DuplicateDescription);
            }

            let item = TodoItem {
                id: Uuid::new_v4(),
                description: request.description,
                is_completed: request.is_completed,
            };

            if !self.repository.create(&item).await? {
                return Err(ServiceError::WriteRejected);
            }

            info!("Created to do item with id {}", item.id);
            Ok(item)
        })
        .await
    }

    /// Update an existing to do item
    ///
    /// A concurrency conflict from the repository is resolved exactly once
    /// by re-checking existence: a vanished item reports not-found, a still
    /// present one propagates as an unexpected fault.
    pub async fn update(&self, id: Uuid, item: TodoItem) -> Result<(), ServiceError> {
        instrumented("update", async {
            info!("Updating to do item with id {}", id);

            if id != item.id {
                return Err(ServiceError::IdMismatch);
            }

            match self.repository.update(&item).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(ServiceError::WriteRejected),
                Err(RepositoryError::Conflict { id }) => {
                    if self.repository.get(id).await?.is_none() {
                        Err(ServiceError::NotFound)
                    } else {
                        Err(ServiceError::Store(anyhow!(
                            "write conflict on to do item {} which still exists",
                            id
                        )))
                    }
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// Delete a to do item
    ///
    /// Existence is checked first; a missing item reports not-found without
    /// touching the store.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        instrumented("delete", async {
            info!("Deleting to do item with id {}", id);

            if self.repository.get(id).await?.is_none() {
                return Err(ServiceError::NotFound);
            }

            self.repository.delete(id).await?;

            info!("Deleted to do item with id {}", id);
            Ok(())
        })
        .await
    }
}
