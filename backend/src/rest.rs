use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use shared::{CreateTodoItemRequest, TodoItem};
use tracing::info;
use uuid::Uuid;

use crate::domain::{ServiceError, TodoService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub todo_service: TodoService,
}

impl AppState {
    pub fn new(todo_service: TodoService) -> Self {
        Self { todo_service }
    }
}

/// Build the API router for to do items
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/todoitems", get(list_todo_items).post(create_todo_item))
        .route(
            "/todoitems/:id",
            get(get_todo_item).put(update_todo_item).delete(delete_todo_item),
        )
        .with_state(state)
}

/// Map a service rejection or fault onto the status code callers expect
fn error_response(err: ServiceError) -> (StatusCode, String) {
    match err {
        ServiceError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Store(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong".to_string())
        }
        other => (StatusCode::BAD_REQUEST, other.to_string()),
    }
}

/// Axum handler for GET /api/todoitems
pub async fn list_todo_items(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/todoitems");

    match state.todo_service.list_active().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Axum handler for GET /api/todoitems/:id
pub async fn get_todo_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("GET /api/todoitems/{}", id);

    match state.todo_service.get(id).await {
        Ok(Some(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Axum handler for POST /api/todoitems
pub async fn create_todo_item(
    State(state): State<AppState>,
    Json(request): Json<CreateTodoItemRequest>,
) -> impl IntoResponse {
    info!("POST /api/todoitems - description: {}", request.description);

    match state.todo_service.create(request).await {
        Ok(item) => {
            let location = format!("/api/todoitems/{}", item.id);
            (StatusCode::CREATED, [(header::LOCATION, location)], Json(item)).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

/// Axum handler for PUT /api/todoitems/:id
pub async fn update_todo_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(item): Json<TodoItem>,
) -> impl IntoResponse {
    info!("PUT /api/todoitems/{}", id);

    match state.todo_service.update(id, item).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Axum handler for DELETE /api/todoitems/:id
pub async fn delete_todo_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("DELETE /api/todoitems/{}", id);

    match state.todo_service.delete(id).await {
        Ok(()) => (StatusCode::OK, format!("Deleted to do item with ID: {}", id)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_not_found_maps_to_404_with_stable_text() {
        let (status, body) = error_response(ServiceError::NotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "To do item not found");
    }

    #[test]
    fn test_validation_rejections_map_to_400() {
        let (status, body) = error_response(ServiceError::DescriptionRequired);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Description is required");

        let (status, body) = error_response(ServiceError::DuplicateDescription);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Description already exists");

        let (status, _) = error_response(ServiceError::IdMismatch);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_faults_map_to_500_without_detail() {
        let (status, body) = error_response(ServiceError::Store(anyhow!("disk on fire")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("disk on fire"));
    }
}
