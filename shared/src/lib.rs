use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single to do item as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Assigned once at creation by the backend, immutable afterwards
    pub id: Uuid,
    /// Non-empty description; unique (case-insensitively) among active items
    pub description: String,
    /// Whether the item has been completed
    pub is_completed: bool,
}

/// Request body for creating a new to do item
///
/// The backend assigns the id, so callers only supply the description and
/// (optionally) the completion flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoItemRequest {
    /// A missing field deserializes to an empty string, which the backend
    /// rejects the same way as an explicitly empty one.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
}
