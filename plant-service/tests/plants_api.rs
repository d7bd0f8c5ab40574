//! Integration tests for the catalog endpoints.

mod common;

use common::spawn_app;
use reqwest::{Client, StatusCode};
use serde_json::Value;

async fn get_json(client: &Client, url: String) -> (StatusCode, Value) {
    let response = client.get(url).send().await.expect("request failed");
    let status = response.status();
    let body = response.json().await.expect("invalid JSON body");
    (status, body)
}

#[tokio::test]
async fn list_returns_full_catalog_with_pagination_block() {
    let port = spawn_app(None).await;
    let client = Client::new();

    let (status, body) = get_json(
        &client,
        format!("http://localhost:{}/api/v1/plants/list", port),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let total = body["pagination"]["total"].as_u64().unwrap();
    assert!(total > 0);
    assert_eq!(body["data"].as_array().unwrap().len() as u64, total);
    assert_eq!(body["pagination"]["has_more"], false);
}

#[tokio::test]
async fn list_pagination_slices_and_signals_more() {
    let port = spawn_app(None).await;
    let client = Client::new();

    let (status, first) = get_json(
        &client,
        format!(
            "http://localhost:{}/api/v1/plants/list?limit=3&offset=0",
            port
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"].as_array().unwrap().len(), 3);
    assert_eq!(first["pagination"]["has_more"], true);

    let total = first["pagination"]["total"].as_u64().unwrap();
    let (_, past_end) = get_json(
        &client,
        format!(
            "http://localhost:{}/api/v1/plants/list?limit=3&offset={}",
            port,
            total + 5
        ),
    )
    .await;
    assert_eq!(past_end["data"].as_array().unwrap().len(), 0);
    assert_eq!(past_end["pagination"]["has_more"], false);
}

#[tokio::test]
async fn list_rejects_out_of_range_limit() {
    let port = spawn_app(None).await;
    let client = Client::new();

    for limit in ["0", "101"] {
        let (status, body) = get_json(
            &client,
            format!(
                "http://localhost:{}/api/v1/plants/list?limit={}",
                port, limit
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn search_finds_moringa_exactly_once() {
    let port = spawn_app(None).await;
    let client = Client::new();

    let (status, body) = get_json(
        &client,
        format!(
            "http://localhost:{}/api/v1/plants/search?q=moringa&limit=10",
            port
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results_count"], 1);
    assert_eq!(body["data"][0]["id"], "moringa-oleifera");
    assert_eq!(body["data"][0]["scientific_name"], "Moringa oleifera");
}

#[tokio::test]
async fn search_rejects_short_query() {
    let port = spawn_app(None).await;
    let client = Client::new();

    let (status, _) = get_json(
        &client,
        format!("http://localhost:{}/api/v1/plants/search?q=m", port),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_by_id_returns_record_or_404() {
    let port = spawn_app(None).await;
    let client = Client::new();

    let (status, body) = get_json(
        &client,
        format!("http://localhost:{}/api/v1/plants/moringa-oleifera", port),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "moringa-oleifera");

    let (status, body) = get_json(
        &client,
        format!("http://localhost:{}/api/v1/plants/unknown-id", port),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("moringa-oleifera"));
}

#[tokio::test]
async fn by_condition_matches_traditional_uses() {
    let port = spawn_app(None).await;
    let client = Client::new();

    let (status, body) = get_json(
        &client,
        format!(
            "http://localhost:{}/api/v1/plants/by-condition/immun",
            port
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"moringa-oleifera"));
}

#[tokio::test]
async fn stats_reports_distinct_counts() {
    let port = spawn_app(None).await;
    let client = Client::new();

    let (status, body) = get_json(
        &client,
        format!("http://localhost:{}/api/v1/plants/stats/overview", port),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let stats = &body["stats"];
    assert!(stats["total_plants"].as_u64().unwrap() > 0);
    assert_eq!(
        stats["total_countries"].as_u64().unwrap() as usize,
        stats["countries"].as_array().unwrap().len()
    );
}
