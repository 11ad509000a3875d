//! HTTP-level behavior of the health routes.

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;
use vitals_core::prelude::*;

fn server(health: HealthCheck) -> anyhow::Result<TestServer> {
    Ok(TestServer::new(vitals_server::routes(health))?)
}

#[tokio::test]
async fn empty_health_is_ok() -> anyhow::Result<()> {
    let server = server(HealthCheck::default())?;

    let response = server.get("/health").await;
    let body = response.json::<Value>();

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "application/json");
    assert_eq!(body["status"], "success");
    assert_eq!(body["results"], serde_json::json!([]));
    Ok(())
}

#[tokio::test]
async fn failing_check_uses_configured_status() -> anyhow::Result<()> {
    let config = HealthConfig::builder().with_failed_status(503u16).build()?;
    let health = HealthCheck::new(config);
    health
        .register_check(check_fn("always_fail", || Ok((false, "boom".into()))))
        .await;
    let server = server(health)?;

    let response = server.get("/health").await;
    let body = response.json::<Value>();

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "failure");
    assert_eq!(body["results"][0]["checker"], "always_fail");
    assert_eq!(body["results"][0]["output"], "boom");
    Ok(())
}

#[tokio::test]
async fn single_check_route_filters() -> anyhow::Result<()> {
    let health = HealthCheck::default();
    health
        .register_check(check_fn("database", || Ok((true, "connected".into()))))
        .await;
    health
        .register_check(check_fn("queue", || Ok((false, "unreachable".into()))))
        .await;
    let server = server(health)?;

    let response = server.get("/health/database").await;
    let body = response.json::<Value>();
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["results"][0]["checker"], "database");

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn plain_bodies_are_forwarded() -> anyhow::Result<()> {
    let health = HealthCheck::default()
        .without_success_renderer()
        .without_failure_renderer();
    let server = server(health)?;

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");
    Ok(())
}

#[tokio::test]
async fn sections_reach_the_client() -> anyhow::Result<()> {
    let health = HealthCheck::default();
    health
        .register_section("version", Section::value("1.2.3"))
        .await?;
    let server = server(health)?;

    let body = server.get("/health").await.json::<Value>();
    assert_eq!(body["version"], "1.2.3");
    Ok(())
}

#[tokio::test]
async fn slow_check_times_out() -> anyhow::Result<()> {
    let config = HealthConfig::builder().with_error_timeout_secs(0.2).build()?;
    let health = HealthCheck::new(config);
    health
        .register_check(async_check_fn("slow", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok((true, "done".to_owned()))
        }))
        .await;
    let server = server(health)?;

    let response = server.get("/health").await;
    let body = response.json::<Value>();

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["results"][0]["output"], "Timeout");
    Ok(())
}
