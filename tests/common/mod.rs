#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde_json::{json, Value};

use taskboard::auth::SessionKeys;
use taskboard::config::AppConfig;
use taskboard::database::MemoryStore;
use taskboard::views::JsonRenderer;
use taskboard::{router, AppState};

pub struct TestServer {
    pub base_url: String,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Serve the full router over TCP with an in-memory store and the JSON
/// renderer, so page responses can be inspected as `{view, data}`.
pub async fn spawn_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    let sessions = SessionKeys::from_config(&AppConfig::development().session)?;
    let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(JsonRenderer), sessions);
    let app = router(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
    })
}

/// Client that reports redirects instead of following them
pub fn client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

/// `name=value` part of the response's Set-Cookie header
pub fn session_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

/// Sign up a fresh user; returns the user record and the session cookie
pub async fn signup(server: &TestServer, name: &str, email: &str) -> Result<(Value, String)> {
    let res = client()
        .post(server.url("/api/users"))
        .json(&json!({ "name": name, "email": email, "password": "password123" }))
        .send()
        .await?;
    anyhow::ensure!(res.status().is_success(), "signup failed: {}", res.status());

    let cookie = session_cookie(&res).context("signup did not set a session cookie")?;
    let user = res.json::<Value>().await?;
    Ok((user, cookie))
}

pub async fn create_project(server: &TestServer, cookie: &str, name: &str) -> Result<Value> {
    let res = client()
        .post(server.url("/api/projects"))
        .header(header::COOKIE, cookie)
        .json(&json!({ "name": name }))
        .send()
        .await?;
    anyhow::ensure!(res.status().is_success(), "create project failed: {}", res.status());
    Ok(res.json::<Value>().await?)
}

pub async fn create_task(server: &TestServer, cookie: &str, project_id: i64, name: &str) -> Result<Value> {
    let res = client()
        .post(server.url("/api/tasks"))
        .header(header::COOKIE, cookie)
        .json(&json!({ "name": name, "project_id": project_id }))
        .send()
        .await?;
    anyhow::ensure!(res.status().is_success(), "create task failed: {}", res.status());
    Ok(res.json::<Value>().await?)
}
