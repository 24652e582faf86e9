//! Route definitions for the API.

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::auth::{require_api_key, ApiKeyValidator, API_KEY_HEADER};
use crate::AppState;

/// Security scheme modifier for OpenAPI.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_todo,
        handlers::list_todos,
        handlers::get_todo,
        handlers::update_todo,
        handlers::delete_todo,
        handlers::health_check,
    ),
    components(schemas(
        crate::api::types::CreateTodoRequest,
        crate::api::types::UpdateTodoRequest,
        crate::api::types::HealthResponse,
        crate::domain::Todo,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "todos", description = "Todo management"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "tAPI - Todo API",
        version = "1.0.0",
        description = "Create, list, update and delete todos. All /todos endpoints require the X-API-Key header.",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router.
///
/// `/todos` routes sit behind the API key middleware; `/health`, `/docs`,
/// `/redoc` and `/openapi.json` are public.
pub fn build_router(state: AppState, api_key_validator: ApiKeyValidator) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let todo_routes = Router::new()
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/:id",
            get(handlers::get_todo)
                .patch(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .route_layer(middleware::from_fn_with_state(
            api_key_validator,
            require_api_key,
        ))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state);

    Router::new()
        .merge(todo_routes)
        .merge(public_routes)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/redoc", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::storage::TodoRepository;

    const KEY: &str = "sk-test-key";

    async fn test_app() -> Router {
        crate::logging::init_test();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        let repository = TodoRepository::new(pool);
        repository.init_schema().await.expect("Failed to init schema");

        build_router(AppState { repository }, ApiKeyValidator::new(KEY))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create(app: &Router, body: Value) -> Value {
        let (status, todo) = send(app, Method::POST, "/todos/", Some(KEY), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        todo
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = test_app().await;

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let app = test_app().await;

        let (status, body) = send(&app, Method::GET, "/todos/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_wrong_key_is_forbidden() {
        let app = test_app().await;

        for key in ["sk-test-kez", "short", "sk-test-key-but-longer"] {
            let (status, _) = send(&app, Method::GET, "/todos/", Some(key), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }

        let (status, _) = send(&app, Method::GET, "/todos/", Some(" sk-test-key "), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let app = test_app().await;

        let created = create(
            &app,
            json!({
                "title": "Complete project documentation",
                "description": "Write comprehensive API documentation",
                "due_at": "2024-12-31T23:59:59Z",
                "estimated_minutes": 120,
                "priority": 2,
                "tags": ["work", "urgent"]
            }),
        )
        .await;

        let id = created["id"].as_str().unwrap();
        let (status, fetched) =
            send(&app, Method::GET, &format!("/todos/{}", id), Some(KEY), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
        assert_eq!(fetched["title"], "Complete project documentation");
        assert_eq!(fetched["estimated_minutes"], 120);
        assert_eq!(fetched["priority"], 2);
        assert_eq!(fetched["status"], "todo");
        assert_eq!(fetched["tags"], json!(["work", "urgent"]));
        assert!(fetched["created_at"].is_string());
        assert!(fetched["updated_at"].is_null());
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/todos/",
            Some(KEY),
            Some(json!({"title": "x", "priority": 7})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_ARGUMENT");

        let (status, _) = send(
            &app,
            Method::POST,
            "/todos/",
            Some(KEY),
            Some(json!({"description": "no title"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = test_app().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/todos/")
            .header(API_KEY_HEADER, KEY)
            .header("content-type", "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_status_only() {
        let app = test_app().await;

        let created = create(
            &app,
            json!({"title": "Ship release", "tags": ["work"], "priority": 1}),
        )
        .await;
        let uri = format!("/todos/{}", created["id"].as_str().unwrap());

        let (status, updated) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(KEY),
            Some(json!({"status": "done"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "done");
        assert!(updated["updated_at"].is_string());
        assert_eq!(updated["title"], created["title"]);
        assert_eq!(updated["tags"], created["tags"]);
        assert_eq!(updated["priority"], created["priority"]);
        assert_eq!(updated["created_at"], created["created_at"]);
    }

    #[tokio::test]
    async fn test_patch_null_clears_and_rejects_required() {
        let app = test_app().await;

        let created = create(
            &app,
            json!({"title": "Write report", "description": "draft", "tags": ["work"]}),
        )
        .await;
        let uri = format!("/todos/{}", created["id"].as_str().unwrap());

        let (status, updated) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(KEY),
            Some(json!({"description": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(updated["description"].is_null());
        assert_eq!(updated["tags"], json!(["work"]));

        let (status, _) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(KEY),
            Some(json!({"title": null})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_list_filters_are_anded() {
        let app = test_app().await;

        let a = create(
            &app,
            json!({"title": "Buy milk", "tags": ["home"], "status": "todo"}),
        )
        .await;
        create(
            &app,
            json!({"title": "Buy bread", "tags": ["work"], "status": "done"}),
        )
        .await;

        let (status, body) =
            send(&app, Method::GET, "/todos/?q=buy&tag=home", Some(KEY), None).await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], a["id"]);

        let (_, body) = send(&app, Method::GET, "/todos?status=done", Some(KEY), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) =
            send(&app, Method::GET, "/todos/?status=archived", Some(KEY), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_limit_above_ceiling_is_clamped() {
        let app = test_app().await;

        create(&app, json!({"title": "Only one"})).await;

        let (status, body) = send(&app, Method::GET, "/todos/?limit=5000", Some(KEY), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::GET, "/todos/?limit=lots", Some(KEY), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_limit_zero_returns_no_items() {
        let app = test_app().await;

        create(&app, json!({"title": "First"})).await;
        create(&app, json!({"title": "Second"})).await;

        let (status, body) = send(&app, Method::GET, "/todos/?limit=0", Some(KEY), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_title_search_folds_non_ascii_case() {
        let app = test_app().await;

        let created = create(&app, json!({"title": "ÉCOLE supplies"})).await;
        create(&app, json!({"title": "Groceries"})).await;

        let (status, body) =
            send(&app, Method::GET, "/todos/?q=%C3%A9cole", Some(KEY), None).await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_naive_due_at_is_read_as_utc() {
        let app = test_app().await;

        let created = create(
            &app,
            json!({"title": "File taxes", "due_at": "2024-12-31T23:59:59"}),
        )
        .await;
        assert_eq!(created["due_at"], "2024-12-31T23:59:59Z");

        let uri = format!("/todos/{}", created["id"].as_str().unwrap());
        let (status, updated) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(KEY),
            Some(json!({"due_at": "2025-06-30T12:00:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["due_at"], "2025-06-30T12:00:00Z");

        let (status, body) = send(
            &app,
            Method::POST,
            "/todos/",
            Some(KEY),
            Some(json!({"title": "x", "due_at": "next week"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_missing_id_operations_are_not_found() {
        let app = test_app().await;
        let uri = format!("/todos/{}", Uuid::new_v4());

        let (status, _) = send(&app, Method::GET, &uri, Some(KEY), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(KEY),
            Some(json!({"status": "done"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, &uri, Some(KEY), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_id_is_invalid_argument() {
        let app = test_app().await;

        let (status, body) = send(&app, Method::GET, "/todos/not-a-uuid", Some(KEY), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_delete_then_get_and_delete_again() {
        let app = test_app().await;

        let created = create(&app, json!({"title": "Temporary"})).await;
        let uri = format!("/todos/{}", created["id"].as_str().unwrap());

        let (status, body) = send(&app, Method::DELETE, &uri, Some(KEY), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());

        let (status, _) = send(&app, Method::GET, &uri, Some(KEY), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, &uri, Some(KEY), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let app = test_app().await;

        let (status, body) = send(&app, Method::GET, "/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/todos/"].is_object());
        assert!(body["paths"]["/todos/{id}"].is_object());

        let params = body["paths"]["/todos/"]["get"]["parameters"]
            .as_array()
            .unwrap();
        assert!(params.iter().any(|p| p["name"] == "limit"));
    }

    #[tokio::test]
    async fn test_redoc_is_served() {
        let app = test_app().await;

        let request = Request::builder()
            .uri("/redoc")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
