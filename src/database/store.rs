use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::database::models::{
    NewProject, NewTask, Project, ProjectDetail, ProjectPatch, Task, TaskDetail, User, UserDetail,
};

/// Errors from any `Store` implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Duplicate value: {0}")]
    Duplicate(String),

    #[error("Missing referenced record: {0}")]
    MissingReference(String),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// Short machine-readable kind, sent alongside the message in 500 bodies
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::ConfigMissing(_) => "ConfigMissing",
            StoreError::InvalidDatabaseUrl => "InvalidDatabaseUrl",
            StoreError::Duplicate(_) => "UniqueConstraintError",
            StoreError::MissingReference(_) => "ForeignKeyConstraintError",
            StoreError::Migration(_) => "MigrationError",
            StoreError::Sqlx(_) => "DatabaseError",
        }
    }
}

/// Persistence boundary for users, projects and tasks.
///
/// Relation loading is part of the contract: `find_project` answers with the
/// owner and tasks already attached, however the implementation gets them.
/// Mutations report affected row counts the way SQL does, so a count of zero
/// means no record matched.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// `password` must already be hashed
    async fn create_user(&self, name: &str, email: &str, password: &str) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_detail(&self, id: i64) -> Result<Option<UserDetail>, StoreError>;

    async fn create_session(
        &self,
        id: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    /// Owner of the session, or `None` once it is destroyed or expired
    async fn find_session_user(&self, id: &str) -> Result<Option<i64>, StoreError>;
    async fn destroy_session(&self, id: &str) -> Result<u64, StoreError>;

    async fn create_project(&self, user_id: i64, input: NewProject) -> Result<Project, StoreError>;
    async fn find_projects(&self) -> Result<Vec<ProjectDetail>, StoreError>;
    async fn find_project(&self, id: i64) -> Result<Option<ProjectDetail>, StoreError>;
    async fn update_project(&self, id: i64, patch: ProjectPatch) -> Result<u64, StoreError>;
    async fn destroy_project(&self, id: i64) -> Result<u64, StoreError>;

    /// `None` when `input.project_id` does not exist
    async fn create_task(&self, user_id: i64, input: NewTask) -> Result<Option<Task>, StoreError>;
    async fn find_tasks(&self) -> Result<Vec<TaskDetail>, StoreError>;
    async fn find_task(&self, id: i64) -> Result<Option<TaskDetail>, StoreError>;
    async fn destroy_task(&self, id: i64) -> Result<u64, StoreError>;
}
