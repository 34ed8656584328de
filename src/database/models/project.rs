use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::task::Task;
use super::user::UserSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub date_created: DateTime<Utc>,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
}

/// Project with its owner and tasks attached
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub user: UserSummary,
    pub tasks: Vec<Task>,
}

/// Fields a caller may set when creating a project.
///
/// Anything else in the request body (`id`, `user_id`, `date_created`, ...) is
/// dropped during deserialization; the owner always comes from the session.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Fields a caller may change on an existing project. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProjectPatch {
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = Some(description.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_project_ignores_owner_in_payload() {
        let input: NewProject =
            serde_json::from_value(json!({ "name": "X", "user_id": 99, "id": 5 })).unwrap();
        assert_eq!(input.name, "X");
        assert!(input.description.is_none());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut project = Project {
            id: 1,
            name: "Old".into(),
            description: Some("keep".into()),
            date_created: Utc::now(),
            user_id: 7,
        };
        let patch: ProjectPatch =
            serde_json::from_value(json!({ "name": "New", "user_id": 1 })).unwrap();
        patch.apply(&mut project);

        assert_eq!(project.name, "New");
        assert_eq!(project.description.as_deref(), Some("keep"));
        assert_eq!(project.user_id, 7);
    }
}
