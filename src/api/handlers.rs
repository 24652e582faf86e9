//! HTTP request handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::api::types::*;
use crate::domain::Todo;
use crate::error::TodoResult;
use crate::AppState;

/// Create a new todo.
///
/// POST /todos/
#[utoipa::path(
    post,
    path = "/todos/",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = Todo),
        (status = 400, description = "Malformed JSON"),
        (status = 401, description = "Missing API key header"),
        (status = 403, description = "Invalid API key"),
        (status = 422, description = "Invalid field values"),
        (status = 503, description = "Backing store unavailable")
    ),
    security(("api_key" = [])),
    tag = "todos"
)]
pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> TodoResult<(StatusCode, Json<Todo>)> {
    let Json(request) = payload?;
    let new = request.validate()?;

    let todo = state.repository.create(new).await?;

    tracing::info!(todo_id = %todo.id, "Todo created");

    Ok((StatusCode::CREATED, Json(todo)))
}

/// List todos with optional filtering.
///
/// GET /todos/
#[utoipa::path(
    get,
    path = "/todos/",
    params(ListTodosQuery),
    responses(
        (status = 200, description = "Todos matching every filter", body = [Todo]),
        (status = 401, description = "Missing API key header"),
        (status = 403, description = "Invalid API key"),
        (status = 422, description = "Invalid query parameters"),
        (status = 503, description = "Backing store unavailable")
    ),
    security(("api_key" = [])),
    tag = "todos"
)]
pub async fn list_todos(
    State(state): State<AppState>,
    query: Result<Query<ListTodosQuery>, QueryRejection>,
) -> TodoResult<Json<Vec<Todo>>> {
    let Query(query) = query?;
    let filter = query.into_filter();

    let todos = state.repository.list(&filter).await?;

    tracing::debug!(
        count = todos.len(),
        limit = filter.limit,
        "Listed todos"
    );

    Ok(Json(todos))
}

/// Get a todo by ID.
///
/// GET /todos/{id}
#[utoipa::path(
    get,
    path = "/todos/{id}",
    params(
        ("id" = String, Path, description = "Todo ID (UUID)")
    ),
    responses(
        (status = 200, description = "The todo", body = Todo),
        (status = 401, description = "Missing API key header"),
        (status = 403, description = "Invalid API key"),
        (status = 404, description = "Todo not found"),
        (status = 422, description = "Malformed todo ID")
    ),
    security(("api_key" = [])),
    tag = "todos"
)]
pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TodoResult<Json<Todo>> {
    let id = parse_todo_id(&id)?;

    let todo = state.repository.get(id).await?;

    Ok(Json(todo))
}

/// Partially update a todo. Only fields present in the body are changed.
///
/// PATCH /todos/{id}
#[utoipa::path(
    patch,
    path = "/todos/{id}",
    params(
        ("id" = String, Path, description = "Todo ID (UUID)")
    ),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "The updated todo", body = Todo),
        (status = 400, description = "Malformed JSON"),
        (status = 401, description = "Missing API key header"),
        (status = 403, description = "Invalid API key"),
        (status = 404, description = "Todo not found"),
        (status = 422, description = "Invalid field values or todo ID")
    ),
    security(("api_key" = [])),
    tag = "todos"
)]
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> TodoResult<Json<Todo>> {
    let id = parse_todo_id(&id)?;
    let Json(request) = payload?;
    let patch = request.validate()?;

    let todo = state.repository.update(id, patch).await?;

    tracing::info!(todo_id = %id, status = %todo.status, "Todo updated");

    Ok(Json(todo))
}

/// Delete a todo.
///
/// DELETE /todos/{id}
#[utoipa::path(
    delete,
    path = "/todos/{id}",
    params(
        ("id" = String, Path, description = "Todo ID (UUID)")
    ),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 401, description = "Missing API key header"),
        (status = 403, description = "Invalid API key"),
        (status = 404, description = "Todo not found"),
        (status = 422, description = "Malformed todo ID")
    ),
    security(("api_key" = [])),
    tag = "todos"
)]
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TodoResult<StatusCode> {
    let id = parse_todo_id(&id)?;

    state.repository.delete(id).await?;

    tracing::info!(todo_id = %id, "Todo deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint.
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Liveness only: a down database is reported but still answers 200.
    let db_status = match state.repository.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
