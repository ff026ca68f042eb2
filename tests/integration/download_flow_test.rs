//! Happy-path scenarios: engine-level and over HTTP.

use std::time::Duration;

use http::StatusCode;
use serde_json::json;

use bundlehub_entity::job::JobStatus;
use bundlehub_service::Resolution;

use crate::helpers::{TestApp, TestEngine, fast_config, single_file_request};

#[tokio::test]
async fn test_happy_path_completes() {
    let engine = TestEngine::start(fast_config(), Vec::new()).await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");
    assert_eq!(receipt.status, JobStatus::Queued);
    assert_eq!(receipt.total_file_ids, 1);

    let job = engine
        .wait_for_terminal(receipt.job_id, Duration::from_secs(5))
        .await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress_percent, 100);
    assert_eq!(job.attempts, 1);
    assert!(job.completed_at.is_some());
    let result = job.result.expect("completed job carries a result");
    assert!(!result.url.is_empty());
    assert!(result.checksum.starts_with("sha256:"));
    assert!(result.size > 0);
    assert!(job.error.is_none());

    match engine.service.resolve(&receipt.job_id) {
        Resolution::Redirect(url) => assert_eq!(url, result.url),
        other => panic!("expected a redirect, got {other:?}"),
    }

    engine.stop().await;
}

#[tokio::test]
async fn test_status_matches_initiate() {
    let engine = TestEngine::start(fast_config(), Vec::new()).await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");

    let snapshot = engine
        .service
        .status(&receipt.job_id)
        .expect("job should be visible immediately after initiate");
    assert_eq!(snapshot.id, receipt.job_id);
    assert_eq!(snapshot.file_ids, vec![70_000]);
    assert_ne!(snapshot.status, JobStatus::Expired);

    engine.stop().await;
}

#[tokio::test]
async fn test_http_round_trip() {
    let app = TestApp::start(fast_config()).await;

    let accepted = app
        .request(
            "POST",
            "/v1/download/initiate",
            Some(json!({"file_ids": [70_000], "priority": "standard"})),
        )
        .await;
    assert_eq!(accepted.status, StatusCode::ACCEPTED, "{:?}", accepted.body);
    let job_id = accepted.body["jobId"].as_str().expect("jobId").to_string();
    assert_eq!(accepted.body["status"], "queued");
    assert_eq!(accepted.body["totalFileIds"], 1);
    assert!(accepted.body["nextPollInMs"].as_u64().expect("poll hint") > 0);

    // Poll the status endpoint until the job finishes.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let status = app
            .request("GET", &format!("/v1/download/status/{job_id}"), None)
            .await;
        assert_eq!(status.status, StatusCode::OK);
        if status.body["status"] == "completed" {
            assert_eq!(status.body["progressPercent"], 100);
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job did not complete in time: {:?}",
            status.body
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // Default resolve redirects to the presigned URL.
    let redirect = app
        .request("GET", &format!("/v1/download/{job_id}"), None)
        .await;
    assert_eq!(redirect.status, StatusCode::FOUND);
    let location = redirect
        .headers
        .get("location")
        .expect("Location header")
        .to_str()
        .expect("Location is a string");
    assert!(location.contains("token="));

    // format=json returns the snapshot instead.
    let as_json = app
        .request("GET", &format!("/v1/download/{job_id}?format=json"), None)
        .await;
    assert_eq!(as_json.status, StatusCode::OK);
    assert_eq!(as_json.body["result"]["url"].as_str(), Some(location));

    app.engine.stop().await;
}

#[tokio::test]
async fn test_http_single_file_id_form() {
    let app = TestApp::start(fast_config()).await;

    let accepted = app
        .request(
            "POST",
            "/v1/download/initiate",
            Some(json!({"file_id": 70_000})),
        )
        .await;
    assert_eq!(accepted.status, StatusCode::ACCEPTED);
    assert_eq!(accepted.body["totalFileIds"], 1);

    app.engine.stop().await;
}

#[tokio::test]
async fn test_http_validation_errors() {
    let app = TestApp::start(fast_config()).await;

    let empty = app
        .request("POST", "/v1/download/initiate", Some(json!({"file_ids": []})))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let out_of_range = app
        .request(
            "POST",
            "/v1/download/initiate",
            Some(json!({"file_ids": [5]})),
        )
        .await;
    assert_eq!(out_of_range.status, StatusCode::BAD_REQUEST);

    let bad_priority = app
        .request(
            "POST",
            "/v1/download/initiate",
            Some(json!({"file_ids": [70_000], "priority": "urgent"})),
        )
        .await;
    assert_eq!(bad_priority.status, StatusCode::BAD_REQUEST);

    app.engine.stop().await;
}

#[tokio::test]
async fn test_http_unknown_job_is_404() {
    let app = TestApp::start(fast_config()).await;

    let missing_status = app
        .request(
            "GET",
            "/v1/download/status/00000000-0000-4000-8000-000000000000",
            None,
        )
        .await;
    assert_eq!(missing_status.status, StatusCode::NOT_FOUND);

    let malformed = app
        .request("GET", "/v1/download/status/not-a-job", None)
        .await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);

    let missing_resolve = app
        .request(
            "GET",
            "/v1/download/00000000-0000-4000-8000-000000000000",
            None,
        )
        .await;
    assert_eq!(missing_resolve.status, StatusCode::NOT_FOUND);

    app.engine.stop().await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::start(fast_config()).await;

    let health = app.request("GET", "/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");
    assert_eq!(health.body["checks"]["storage"], "ok");
    assert!(health.body["queue"]["standard"].is_u64());
    assert_eq!(health.body["jobs"], 0);

    app.engine.stop().await;
}
