use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::SessionKeys;
use crate::config::SecurityConfig;
use crate::database::Store;
use crate::handlers::{api, pages};
use crate::middleware::{require_login, session_middleware};
use crate::views::Renderer;

/// Shared handler dependencies
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub renderer: Arc<dyn Renderer>,
    pub sessions: SessionKeys,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, renderer: Arc<dyn Renderer>, sessions: SessionKeys) -> Self {
        Self {
            store,
            renderer,
            sessions,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(project_routes())
        .merge(task_routes())
        .merge(user_routes())
        .merge(page_routes())
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS layer for the configured origins, or `None` when disabled
pub fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Skipping invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

fn project_routes() -> Router<AppState> {
    use api::projects;

    Router::new()
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/:id",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
}

fn task_routes() -> Router<AppState> {
    use api::tasks;

    Router::new()
        .route("/api/tasks", post(tasks::create))
        .route("/api/tasks/:id", axum::routing::delete(tasks::delete))
}

fn user_routes() -> Router<AppState> {
    use api::users;

    Router::new()
        .route("/api/users", post(users::signup))
        .route("/api/users/login", post(users::login))
        .route("/api/users/logout", post(users::logout))
}

fn page_routes() -> Router<AppState> {
    let gated = Router::new()
        .route("/homepage", get(pages::homepage))
        .route_layer(middleware::from_fn(require_login));

    Router::new()
        .route("/projects", get(pages::projects))
        .route("/project/:id", get(pages::project))
        .route("/login", get(pages::login))
        .route("/tasks", get(pages::tasks))
        .route("/tasks/:id", get(pages::task))
        .merge(gated)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
