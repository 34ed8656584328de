pub mod project;
pub mod task;
pub mod user;

pub use project::{NewProject, Project, ProjectDetail, ProjectPatch, ProjectSummary};
pub use task::{NewTask, Task, TaskDetail};
pub use user::{NewUser, User, UserDetail, UserSummary};
