use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use crate::database::models::{
    NewProject, NewTask, Project, ProjectDetail, ProjectPatch, ProjectSummary, Task, TaskDetail,
    User, UserDetail, UserSummary,
};
use crate::database::store::{Store, StoreError};

const USER_JSON: &str = "json_build_object('id', u.id, 'name', u.name, 'email', u.email)";

#[derive(FromRow)]
struct ProjectRow {
    #[sqlx(flatten)]
    project: Project,
    user: Json<UserSummary>,
    tasks: Json<Vec<Task>>,
}

impl From<ProjectRow> for ProjectDetail {
    fn from(row: ProjectRow) -> Self {
        ProjectDetail {
            project: row.project,
            user: row.user.0,
            tasks: row.tasks.0,
        }
    }
}

#[derive(FromRow)]
struct TaskRow {
    #[sqlx(flatten)]
    task: Task,
    user: Json<UserSummary>,
    project: Json<ProjectSummary>,
}

impl From<TaskRow> for TaskDetail {
    fn from(row: TaskRow) -> Self {
        TaskDetail {
            task: row.task,
            user: row.user.0,
            project: row.project.0,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    #[sqlx(flatten)]
    user: UserSummary,
    projects: Json<Vec<Project>>,
}

/// PostgreSQL-backed store. Relations are composed in SQL with JSON sub-selects.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn project_select(filter: &str) -> String {
        format!(
            "SELECT p.id, p.name, p.description, p.date_created, p.user_id, \
                    {USER_JSON} AS \"user\", \
                    COALESCE((SELECT json_agg(t ORDER BY t.id) FROM task t WHERE t.project_id = p.id), '[]'::json) AS tasks \
             FROM project p \
             JOIN \"user\" u ON u.id = p.user_id \
             {filter} \
             ORDER BY p.id"
        )
    }

    fn task_select(filter: &str) -> String {
        format!(
            "SELECT t.id, t.name, t.description, t.date_created, t.project_id, t.user_id, \
                    {USER_JSON} AS \"user\", \
                    json_build_object('id', p.id, 'name', p.name) AS project \
             FROM task t \
             JOIN \"user\" u ON u.id = t.user_id \
             JOIN project p ON p.id = t.project_id \
             {filter} \
             ORDER BY t.id"
        )
    }
}

/// Translate constraint violations into store-level errors
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate(db.message().to_string());
        }
        if db.is_foreign_key_violation() {
            return StoreError::MissingReference(db.message().to_string());
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, name: &str, email: &str, password: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO \"user\" (name, email, password) VALUES ($1, $2, $3) \
             RETURNING id, name, email, password",
        )
        .bind(name)
        .bind(email)
        .bind(password)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password FROM \"user\" WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_detail(&self, id: i64) -> Result<Option<UserDetail>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT u.id, u.name, u.email, \
                    COALESCE((SELECT json_agg(p ORDER BY p.id) FROM project p WHERE p.user_id = u.id), '[]'::json) AS projects \
             FROM \"user\" u WHERE u.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserDetail {
            user: row.user,
            projects: row.projects.0,
        }))
    }

    async fn create_session(
        &self,
        id: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO user_session (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn find_session_user(&self, id: &str) -> Result<Option<i64>, StoreError> {
        let user_id = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM user_session WHERE id = $1 AND expires_at > now()",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user_id)
    }

    async fn destroy_session(&self, id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM user_session WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_project(&self, user_id: i64, input: NewProject) -> Result<Project, StoreError> {
        sqlx::query_as::<_, Project>(
            "INSERT INTO project (name, description, user_id) VALUES ($1, $2, $3) \
             RETURNING id, name, description, date_created, user_id",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn find_projects(&self) -> Result<Vec<ProjectDetail>, StoreError> {
        let rows = sqlx::query_as::<_, ProjectRow>(&Self::project_select(""))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ProjectDetail::from).collect())
    }

    async fn find_project(&self, id: i64) -> Result<Option<ProjectDetail>, StoreError> {
        let row = sqlx::query_as::<_, ProjectRow>(&Self::project_select("WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ProjectDetail::from))
    }

    async fn update_project(&self, id: i64, patch: ProjectPatch) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE project SET name = COALESCE($2, name), description = COALESCE($3, description) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn destroy_project(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM project WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_task(&self, user_id: i64, input: NewTask) -> Result<Option<Task>, StoreError> {
        sqlx::query_as::<_, Task>(
            "INSERT INTO task (name, description, project_id, user_id) \
             SELECT $1::text, $2::text, $3::bigint, $4::bigint \
             WHERE EXISTS (SELECT 1 FROM project WHERE id = $3::bigint) \
             RETURNING id, name, description, date_created, project_id, user_id",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)
    }

    async fn find_tasks(&self) -> Result<Vec<TaskDetail>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(&Self::task_select(""))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(TaskDetail::from).collect())
    }

    async fn find_task(&self, id: i64) -> Result<Option<TaskDetail>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&Self::task_select("WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(TaskDetail::from))
    }

    async fn destroy_task(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM task WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
