//! Server integration tests.
//!
//! These tests run the server on a real socket and drive the session
//! lifecycle over HTTP.

mod common;

use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tessera_session::SessionPolicy;

#[tokio::test]
async fn test_server_health_reports_store() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server.get("/health").send().await?;
    assert!(resp.status().is_success());

    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "faulty");
    assert!(body.get("version").is_some());

    Ok(())
}

#[tokio::test]
async fn test_login_profile_refresh_flow() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server.login("Hugo", "Hugo123").await?;
    assert_eq!(resp.status().as_u16(), 201);
    let session: Value = resp.json().await?;
    assert_eq!(session["origin"], common::TEST_ORIGIN);
    let old = session["sessionID"].as_str().unwrap().to_string();

    let resp = server.profile(&old).await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Hi Hugo!");

    let resp = server.refresh(&old).await?;
    assert_eq!(resp.status().as_u16(), 201);
    let rotated: Value = resp.json().await?;
    let new = rotated["sessionID"].as_str().unwrap().to_string();
    assert_ne!(old, new);

    assert_eq!(server.profile(&old).await?.status().as_u16(), 401);
    assert_eq!(server.profile(&new).await?.status().as_u16(), 200);

    Ok(())
}

#[tokio::test]
async fn test_wrong_credentials() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server.login("Hugo", "Paco123").await?;
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Wrong user or password");

    let resp = server.login("Nobody", "Nobody123").await?;
    assert_eq!(resp.status().as_u16(), 401);

    assert_eq!(server.store.create_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_profile_requires_session() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server.get("/profile").send().await?;
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "You need to login to get a SessionID");

    let resp = server.profile("not-a-session").await?;
    assert_eq!(resp.status().as_u16(), 401);

    Ok(())
}

#[tokio::test]
async fn test_refresh_with_unknown_session() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server.refresh("not-a-session").await?;
    assert_eq!(resp.status().as_u16(), 401);
    assert_eq!(server.store.create_calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_session_expires() -> Result<()> {
    let server =
        common::TestServer::start_with_policy(SessionPolicy::new().with_ttl(Duration::from_secs(1)))
            .await?;

    let id = server.login_ok("Luis", "Luis123").await?;
    assert_eq!(server.profile(&id).await?.status().as_u16(), 200);

    tokio::time::sleep(Duration::from_millis(1300)).await;

    assert_eq!(server.profile(&id).await?.status().as_u16(), 401);
    assert_eq!(server.refresh(&id).await?.status().as_u16(), 401);

    Ok(())
}

#[tokio::test]
async fn test_wrong_method() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server.get("/login").send().await?;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Wrong HTTP method");

    assert_eq!(server.post("/profile").send().await?.status().as_u16(), 400);
    assert_eq!(server.get("/refresh").send().await?.status().as_u16(), 400);

    Ok(())
}

#[tokio::test]
async fn test_malformed_login_body() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .post("/login")
        .header("content-type", "application/json")
        .body("{\"username\":")
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);

    Ok(())
}

#[tokio::test]
async fn test_store_outage_hides_details() -> Result<()> {
    let server = common::TestServer::start().await?;
    let id = server.login_ok("Paco", "Paco123").await?;

    server.store.fail_get(true);

    let resp = server.profile(&id).await?;
    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Internal Server Error");

    assert_eq!(server.get("/health").send().await?.status().as_u16(), 503);

    server.store.fail_get(false);
    assert_eq!(server.profile(&id).await?.status().as_u16(), 200);

    Ok(())
}

#[tokio::test]
async fn test_refresh_tolerates_delete_failure() -> Result<()> {
    let server = common::TestServer::start().await?;
    let old = server.login_ok("Hugo", "Hugo123").await?;

    server.store.fail_delete(true);

    let resp = server.refresh(&old).await?;
    assert_eq!(resp.status().as_u16(), 201);
    let rotated: Value = resp.json().await?;
    let new = rotated["sessionID"].as_str().unwrap().to_string();

    // The old session lingers until its TTL lapses.
    assert_eq!(server.profile(&old).await?.status().as_u16(), 200);
    assert_eq!(server.profile(&new).await?.status().as_u16(), 200);

    Ok(())
}
