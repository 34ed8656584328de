use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::database::models::{
    NewProject, NewTask, Project, ProjectDetail, ProjectPatch, ProjectSummary, Task, TaskDetail,
    User, UserDetail,
};
use crate::database::store::{Store, StoreError};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    projects: BTreeMap<i64, Project>,
    tasks: BTreeMap<i64, Task>,
    sessions: BTreeMap<String, (i64, DateTime<Utc>)>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn user(&self, id: i64) -> Result<&User, StoreError> {
        self.users
            .get(&id)
            .ok_or_else(|| StoreError::MissingReference(format!("user {} does not exist", id)))
    }

    fn project_detail(&self, project: &Project) -> Result<ProjectDetail, StoreError> {
        let user = self.user(project.user_id)?.summary();
        let tasks = self
            .tasks
            .values()
            .filter(|t| t.project_id == project.id)
            .cloned()
            .collect();
        Ok(ProjectDetail {
            project: project.clone(),
            user,
            tasks,
        })
    }

    fn task_detail(&self, task: &Task) -> Result<TaskDetail, StoreError> {
        let user = self.user(task.user_id)?.summary();
        let project = self.projects.get(&task.project_id).ok_or_else(|| {
            StoreError::MissingReference(format!("project {} does not exist", task.project_id))
        })?;
        Ok(TaskDetail {
            task: task.clone(),
            user,
            project: ProjectSummary {
                id: project.id,
                name: project.name.clone(),
            },
        })
    }
}

/// In-process store with the same observable behaviour as `PgStore`:
/// ids come from one increasing sequence, reads are ordered by id, and
/// deleting a project deletes its tasks.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, name: &str, email: &str, password: &str) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email) {
            return Err(StoreError::Duplicate(format!("email {} is already registered", email)));
        }
        let user = User {
            id: tables.next_id(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_detail(&self, id: i64) -> Result<Option<UserDetail>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|user| UserDetail {
            user: user.summary(),
            projects: tables
                .projects
                .values()
                .filter(|p| p.user_id == id)
                .cloned()
                .collect(),
        }))
    }

    async fn create_session(
        &self,
        id: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.user(user_id)?;
        if tables.sessions.contains_key(id) {
            return Err(StoreError::Duplicate(format!("session {} already exists", id)));
        }
        tables.sessions.insert(id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn find_session_user(&self, id: &str) -> Result<Option<i64>, StoreError> {
        let tables = self.tables.read().await;
        let now = Utc::now();
        Ok(tables
            .sessions
            .get(id)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(user_id, _)| *user_id))
    }

    async fn destroy_session(&self, id: &str) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.sessions.remove(id).map_or(0, |_| 1))
    }

    async fn create_project(&self, user_id: i64, input: NewProject) -> Result<Project, StoreError> {
        let mut tables = self.tables.write().await;
        tables.user(user_id)?;
        let project = Project {
            id: tables.next_id(),
            name: input.name,
            description: input.description,
            date_created: Utc::now(),
            user_id,
        };
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_projects(&self) -> Result<Vec<ProjectDetail>, StoreError> {
        let tables = self.tables.read().await;
        tables
            .projects
            .values()
            .map(|p| tables.project_detail(p))
            .collect()
    }

    async fn find_project(&self, id: i64) -> Result<Option<ProjectDetail>, StoreError> {
        let tables = self.tables.read().await;
        tables
            .projects
            .get(&id)
            .map(|p| tables.project_detail(p))
            .transpose()
    }

    async fn update_project(&self, id: i64, patch: ProjectPatch) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.projects.get_mut(&id) {
            Some(project) => {
                patch.apply(project);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn destroy_project(&self, id: i64) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.projects.remove(&id).is_none() {
            return Ok(0);
        }
        tables.tasks.retain(|_, t| t.project_id != id);
        Ok(1)
    }

    async fn create_task(&self, user_id: i64, input: NewTask) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&input.project_id) {
            return Ok(None);
        }
        tables.user(user_id)?;
        let task = Task {
            id: tables.next_id(),
            name: input.name,
            description: input.description,
            date_created: Utc::now(),
            project_id: input.project_id,
            user_id,
        };
        tables.tasks.insert(task.id, task.clone());
        Ok(Some(task))
    }

    async fn find_tasks(&self) -> Result<Vec<TaskDetail>, StoreError> {
        let tables = self.tables.read().await;
        tables.tasks.values().map(|t| tables.task_detail(t)).collect()
    }

    async fn find_task(&self, id: i64) -> Result<Option<TaskDetail>, StoreError> {
        let tables = self.tables.read().await;
        tables.tasks.get(&id).map(|t| tables.task_detail(t)).transpose()
    }

    async fn destroy_task(&self, id: i64) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.tasks.remove(&id).map_or(0, |_| 1))
    }
}
