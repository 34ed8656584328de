// handlers/api/mod.rs - JSON API handlers mounted under /api
//
// Bodies are typed inputs with an explicit set of accepted fields. Store
// failures surface as 500 with the underlying error (see `error::ApiError`).

pub mod projects;
pub mod tasks;
pub mod users;
