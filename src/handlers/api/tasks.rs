use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::{NewTask, Task};
use crate::error::ApiError;
use crate::middleware::Session;

/// POST /api/tasks - add a task to an existing project
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(input): Json<NewTask>,
) -> Result<Json<Task>, ApiError> {
    let user_id = session
        .current_user()
        .ok_or_else(|| ApiError::unauthorized("You must be logged in to create a task"))?;

    match state.store.create_task(user_id, input).await? {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::not_found("No project found with this id!")),
    }
}

/// DELETE /api/tasks/:id - same soft not-found answer as project deletion
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.store.destroy_task(id).await?;
    if deleted == 0 {
        return Ok(Json(json!({ "message": "No task found with this id!" })));
    }
    Ok(Json(json!(deleted)))
}
