use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::{NewProject, Project, ProjectDetail, ProjectPatch};
use crate::error::ApiError;
use crate::middleware::Session;

/// POST /api/projects - create a project owned by the session's user
///
/// Only `name` and `description` are read from the body; the owner is
/// always the logged-in user.
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(input): Json<NewProject>,
) -> Result<Json<Project>, ApiError> {
    let user_id = session
        .current_user()
        .ok_or_else(|| ApiError::unauthorized("You must be logged in to create a project"))?;

    let project = state.store.create_project(user_id, input).await?;
    tracing::info!("User {} created project {}", user_id, project.id);
    Ok(Json(project))
}

/// DELETE /api/projects/:id
///
/// A missing project is answered with 200 and a message, not 404.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.store.destroy_project(id).await?;
    if deleted == 0 {
        return Ok(Json(json!({ "message": "No project found with this id!" })));
    }
    Ok(Json(json!(deleted)))
}

/// GET /api/projects - every project with its owner and tasks
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProjectDetail>>, ApiError> {
    let projects = state.store.find_projects().await?;
    Ok(Json(projects))
}

/// GET /api/projects/:id - `null` body when the project does not exist
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Option<ProjectDetail>>, ApiError> {
    let project = state.store.find_project(id).await?;
    Ok(Json(project))
}

/// PUT /api/projects/:id - responds with `[affected_rows]`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Value>, ApiError> {
    let updated = state.store.update_project(id, patch).await?;
    if updated == 0 {
        return Err(ApiError::not_found("No user found with this id!"));
    }
    Ok(Json(json!([updated])))
}
