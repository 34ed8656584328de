// handlers/mod.rs - request handlers
//
// api   → JSON endpoints under /api (projects, tasks, users)
// pages → server-rendered views (projects, tasks, homepage, login)

pub mod api;
pub mod pages;
