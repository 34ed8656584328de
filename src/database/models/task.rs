use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::project::ProjectSummary;
use super::user::UserSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub date_created: DateTime<Utc>,
    pub project_id: i64,
    pub user_id: i64,
}

/// Task with its assignee and parent project attached
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub user: UserSummary,
    pub project: ProjectSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_id: i64,
}
