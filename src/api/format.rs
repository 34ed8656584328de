//! Plain, template-safe snapshots of composite records.
//!
//! Page views only need names from related records, so relations are
//! projected down to `{ "name": ... }` here. API responses serialize the
//! composite types directly instead.

use serde_json::{json, Map, Value};

use crate::database::models::{Project, ProjectDetail, Task, TaskDetail, UserDetail};

pub fn project_fields(project: &Project) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("id".into(), json!(project.id));
    map.insert("name".into(), json!(project.name));
    map.insert("description".into(), json!(project.description));
    map.insert("date_created".into(), json!(project.date_created));
    map.insert("user_id".into(), json!(project.user_id));
    map
}

pub fn task_fields(task: &Task) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("id".into(), json!(task.id));
    map.insert("name".into(), json!(task.name));
    map.insert("description".into(), json!(task.description));
    map.insert("date_created".into(), json!(task.date_created));
    map.insert("project_id".into(), json!(task.project_id));
    map.insert("user_id".into(), json!(task.user_id));
    map
}

fn name_only(name: &str) -> Value {
    json!({ "name": name })
}

pub fn project_snapshot(detail: &ProjectDetail) -> Map<String, Value> {
    let mut map = project_fields(&detail.project);
    map.insert("user".into(), name_only(&detail.user.name));
    map.insert(
        "tasks".into(),
        Value::Array(detail.tasks.iter().map(|t| name_only(&t.name)).collect()),
    );
    map
}

pub fn task_snapshot(detail: &TaskDetail) -> Map<String, Value> {
    let mut map = task_fields(&detail.task);
    map.insert("user".into(), name_only(&detail.user.name));
    map.insert("project".into(), name_only(&detail.project.name));
    map
}

/// The user without credentials, with full project records
pub fn user_snapshot(detail: &UserDetail) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("id".into(), json!(detail.user.id));
    map.insert("name".into(), json!(detail.user.name));
    map.insert("email".into(), json!(detail.user.email));
    map.insert(
        "projects".into(),
        Value::Array(
            detail
                .projects
                .iter()
                .map(|p| Value::Object(project_fields(p)))
                .collect(),
        ),
    );
    map
}

/// Spread a snapshot into a view context alongside the session flag
pub fn with_logged_in(mut snapshot: Map<String, Value>, logged_in: bool) -> Value {
    snapshot.insert("logged_in".into(), Value::Bool(logged_in));
    Value::Object(snapshot)
}
