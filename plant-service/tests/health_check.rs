//! Integration tests for the health endpoints.
//!
//! Run with: cargo test -p plant-service --test health_check

mod common;

use common::spawn_app;
use reqwest::Client;
use std::time::Duration;

#[tokio::test]
async fn health_check_reports_degraded_without_api_key() {
    let port = spawn_app(None).await;
    let client = Client::new();

    let response = client
        .get(format!("http://localhost:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["service"], "plant-service");
    assert_eq!(body["services"]["gemini"], "not_configured");
    assert_eq!(body["services"]["plants"], "operational");
}

#[tokio::test]
async fn readiness_check_returns_ok() {
    let port = spawn_app(None).await;
    let client = Client::new();

    let response = client
        .get(format!("http://localhost:{}/ready", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}
