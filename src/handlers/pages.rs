// Server-rendered pages. Each handler loads records, flattens them with
// `api::format`, and hands a named view to the configured renderer.

use axum::{
    extract::{Path, State},
    response::Response,
    Extension,
};
use serde_json::{json, Value};

use crate::api::format::{project_snapshot, task_snapshot, user_snapshot, with_logged_in};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::Session;
use crate::views::redirect;

/// GET /projects
pub async fn projects(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, ApiError> {
    let projects: Vec<Value> = state
        .store
        .find_projects()
        .await?
        .iter()
        .map(|p| Value::Object(project_snapshot(p)))
        .collect();

    state.renderer.render(
        "projects",
        json!({ "projects": projects, "logged_in": session.logged_in }),
    )
}

/// GET /project/:id
pub async fn project(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let project = state
        .store
        .find_project(id)
        .await?
        .ok_or_else(|| ApiError::not_found("No project found with this id!"))?;

    state
        .renderer
        .render("project", with_logged_in(project_snapshot(&project), session.logged_in))
}

/// GET /homepage - behind `require_login`
pub async fn homepage(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, ApiError> {
    let user_id = session
        .current_user()
        .ok_or_else(|| ApiError::unauthorized("You must be logged in to view this page"))?;

    let user = state
        .store
        .find_user_detail(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user found with this id!"))?;

    state
        .renderer
        .render("homepage", with_logged_in(user_snapshot(&user), true))
}

/// GET /login - already logged-in visitors go straight to their homepage
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, ApiError> {
    if session.logged_in {
        return Ok(redirect("/homepage"));
    }
    state.renderer.render("login", json!({}))
}

/// GET /tasks/:id
pub async fn task(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let task = state
        .store
        .find_task(id)
        .await?
        .ok_or_else(|| ApiError::not_found("No task found with this id!"))?;

    state
        .renderer
        .render("tasks", with_logged_in(task_snapshot(&task), session.logged_in))
}

/// GET /tasks - rendered with the singular "task" view
pub async fn tasks(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, ApiError> {
    let tasks: Vec<Value> = state
        .store
        .find_tasks()
        .await?
        .iter()
        .map(|t| Value::Object(task_snapshot(t)))
        .collect();

    state
        .renderer
        .render("task", json!({ "tasks": tasks, "logged_in": session.logged_in }))
}
