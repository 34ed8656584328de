mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn homepage_redirects_anonymous_visitors() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = common::client().get(server.url("/homepage")).send().await?;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::LOCATION], "/login");
    Ok(())
}

#[tokio::test]
async fn homepage_renders_session_user_with_projects() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, cookie) = common::signup(&server, "Ada", "ada@example.com").await?;
    common::create_project(&server, &cookie, "Engine").await?;

    let res = common::client()
        .get(server.url("/homepage"))
        .header(header::COOKIE, &cookie)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["view"], "homepage");
    assert_eq!(body["data"]["name"], "Ada");
    assert_eq!(body["data"]["logged_in"], true);
    assert!(body["data"].get("password").is_none());
    assert_eq!(body["data"]["projects"][0]["name"], "Engine");
    Ok(())
}

#[tokio::test]
async fn forged_cookie_does_not_open_homepage() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = common::client()
        .get(server.url("/homepage"))
        .header(header::COOKIE, "sid=eyJhbGciOiJIUzI1NiJ9.e30.forged")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::FOUND);
    Ok(())
}

#[tokio::test]
async fn login_page_redirects_when_logged_in() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, cookie) = common::signup(&server, "Ada", "ada@example.com").await?;

    let res = common::client()
        .get(server.url("/login"))
        .header(header::COOKIE, &cookie)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::LOCATION], "/homepage");
    Ok(())
}

#[tokio::test]
async fn login_page_renders_for_anonymous() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = common::client().get(server.url("/login")).send().await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["view"], "login");
    Ok(())
}

#[tokio::test]
async fn projects_page_shows_names_of_relations() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, cookie) = common::signup(&server, "Ada", "ada@example.com").await?;
    let project = common::create_project(&server, &cookie, "Engine").await?;
    common::create_task(&server, &cookie, project["id"].as_i64().unwrap(), "Bearings").await?;

    let body = common::client()
        .get(server.url("/projects"))
        .send()
        .await?
        .json::<Value>()
        .await?;

    assert_eq!(body["view"], "projects");
    assert_eq!(body["data"]["logged_in"], false);
    let first = &body["data"]["projects"][0];
    assert_eq!(first["name"], "Engine");
    assert_eq!(first["user"], json!({ "name": "Ada" }));
    assert_eq!(first["tasks"], json!([{ "name": "Bearings" }]));
    Ok(())
}

#[tokio::test]
async fn project_page_spreads_fields_and_session_flag() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, cookie) = common::signup(&server, "Ada", "ada@example.com").await?;
    let project = common::create_project(&server, &cookie, "Engine").await?;

    let body = common::client()
        .get(server.url(&format!("/project/{}", project["id"])))
        .header(header::COOKIE, &cookie)
        .send()
        .await?
        .json::<Value>()
        .await?;

    assert_eq!(body["view"], "project");
    assert_eq!(body["data"]["name"], "Engine");
    assert_eq!(body["data"]["user"], json!({ "name": "Ada" }));
    assert_eq!(body["data"]["logged_in"], true);
    Ok(())
}

#[tokio::test]
async fn missing_records_are_404_pages() -> Result<()> {
    let server = common::spawn_server().await?;

    let project = common::client().get(server.url("/project/999")).send().await?;
    assert_eq!(project.status(), StatusCode::NOT_FOUND);

    let task = common::client().get(server.url("/tasks/999")).send().await?;
    assert_eq!(task.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn task_pages_use_their_view_names() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, cookie) = common::signup(&server, "Ada", "ada@example.com").await?;
    let project = common::create_project(&server, &cookie, "Engine").await?;
    let task = common::create_task(&server, &cookie, project["id"].as_i64().unwrap(), "Bearings").await?;

    let list = common::client()
        .get(server.url("/tasks"))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(list["view"], "task");
    assert_eq!(list["data"]["tasks"][0]["project"], json!({ "name": "Engine" }));

    let single = common::client()
        .get(server.url(&format!("/tasks/{}", task["id"])))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(single["view"], "tasks");
    assert_eq!(single["data"]["name"], "Bearings");
    assert_eq!(single["data"]["user"], json!({ "name": "Ada" }));
    Ok(())
}
