//! HTTP Route Tests
//!
//! Requests go through the full router (trace layer included) without
//! binding a socket.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::*;
use repository_driver::config::ServerConfig;
use repository_driver::driver::Driver;
use repository_driver::http_server::HttpServer;
use repository_driver::repo::InMemoryRepositoryManager;

fn router(driver: Arc<Driver>) -> Router {
    HttpServer::new(ServerConfig::default(), driver).router()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Health and Metrics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let driver = driver(maven_repository());
    let response = router(driver).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["activePromotions"], 0);
    assert_eq!(body["shuttingDown"], false);
}

#[tokio::test]
async fn test_health_while_stopping() {
    let driver = driver(maven_repository());
    driver.lifecycle().begin_shutdown();

    let response = router(driver).oneshot(get("/health")).await.unwrap();

    let body = body_json(response).await;
    assert_eq!(body["status"], "stopping");
    assert_eq!(body["shuttingDown"], true);
}

#[tokio::test]
async fn test_metrics_snapshot() {
    let driver = driver(maven_repository());
    let response = router(driver).oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.is_object());
}

// =============================================================================
// Create
// =============================================================================

/// Provisioning returns the tracking URLs of the group and hosted store.
#[tokio::test]
async fn test_create_returns_tracking_urls() {
    let repository = Arc::new(InMemoryRepositoryManager::new("http://indy"));
    let driver = driver(repository.clone());

    let response = router(driver)
        .oneshot(post(
            "/create",
            json!({"buildContentId": "b2", "buildType": "MVN"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["repositoryDependencyUrl"],
        "http://indy/api/folo/track/b2/maven/group/b2"
    );
    assert_eq!(
        body["repositoryDeployUrl"],
        "http://indy/api/folo/track/b2/maven/hosted/b2"
    );
    assert!(repository.store(&key("maven:group:b2")).is_some());
}

#[tokio::test]
async fn test_create_with_blank_id_is_bad_request() {
    let driver = driver(maven_repository());

    let response = router(driver)
        .oneshot(post(
            "/create",
            json!({"buildContentId": " ", "buildType": "MVN"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let driver = driver(maven_repository());

    let response = router(driver)
        .oneshot(post("/create", json!({"buildType": "MAKE"})))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// =============================================================================
// Promote and Collect
// =============================================================================

#[tokio::test]
async fn test_promote_is_accepted() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    let driver = driver(repository);
    let (base, callback) = start_receiver(0).await;

    let response = router(driver)
        .oneshot(post(
            "/promote",
            json!({
                "buildContentId": BUILD_ID,
                "buildType": "MVN",
                "callback": {"method": "POST", "uri": format!("{}/callback", base)}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    callback.wait_for(1).await;
    assert_eq!(callback.count(), 1);
}

#[tokio::test]
async fn test_promote_while_stopping_is_unavailable() {
    let driver = driver(maven_repository());
    driver.lifecycle().begin_shutdown();

    let response = router(driver)
        .oneshot(post(
            "/promote",
            json!({
                "buildContentId": BUILD_ID,
                "buildType": "MVN",
                "callback": {"method": "POST", "uri": "http://127.0.0.1:1/callback"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["code"], "DRIVER_STOPPING");
}

#[tokio::test]
async fn test_collect_returns_artifacts() {
    let repository = maven_repository();
    repository.put_tracking_report(maven_report());
    let driver = driver(repository.clone());

    let response = router(driver)
        .oneshot(post("/collect", json!({"buildContentId": BUILD_ID})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["builtArtifacts"][0]["identifier"], "org.acme:app:jar:2.0");
    assert_eq!(body["dependencies"][0]["identifier"], "org.x:y:jar:1.0");
    assert!(!repository.is_sealed(BUILD_ID));
}

#[tokio::test]
async fn test_collect_without_report_is_bad_gateway() {
    let driver = driver(maven_repository());

    let response = router(driver)
        .oneshot(post("/collect", json!({"buildContentId": "unknown"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to retrieve tracking report for: unknown.");
}
