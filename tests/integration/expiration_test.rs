//! TTL expiration and sweeping.

use std::time::Duration;

use bundlehub_entity::job::JobStatus;

use crate::helpers::{TestEngine, fast_config, single_file_request};

fn expiring_config() -> bundlehub_core::config::AppConfig {
    let mut config = fast_config();
    config.jobs.job_ttl_seconds = 1; // chrono TTL arithmetic is second-granular
    config.jobs.sweep_interval_seconds = 1;
    config.jobs.delay_min_ms = 10_000;
    config.jobs.delay_max_ms = 10_000;
    config
}

#[tokio::test]
async fn test_running_job_expires_and_is_swept() {
    let engine = TestEngine::start(expiring_config(), Vec::new()).await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");
    let id = receipt.job_id;

    // Within a few sweep periods the record is either marked expired or
    // already removed.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(4);
    loop {
        match engine.registry.get(&id) {
            None => break,
            Some(job) if job.status == JobStatus::Expired => break,
            Some(_) => {}
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job was never expired or swept"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // One more sweep period later the record is gone entirely, and the
    // racing worker never staged an artifact.
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(engine.registry.get(&id).is_none());
    assert_eq!(engine.store.put_count(), 0);

    engine.stop().await;
}

#[tokio::test]
async fn test_completed_job_is_swept_after_ttl() {
    let mut config = expiring_config();
    config.jobs.delay_min_ms = 50;
    config.jobs.delay_max_ms = 50;
    let engine = TestEngine::start(config, Vec::new()).await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");
    let job = engine
        .wait_for_terminal(receipt.job_id, Duration::from_secs(3))
        .await;
    assert_eq!(job.status, JobStatus::Completed);

    // Terminal records are removed once their TTL lapses.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(4);
    while engine.registry.get(&receipt.job_id).is_some() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "completed record was never swept"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    engine.stop().await;
}

#[tokio::test]
async fn test_expired_key_is_reusable() {
    let engine = TestEngine::start(expiring_config(), Vec::new()).await;

    let first = engine
        .service
        .initiate(crate::helpers::keyed_request("abc", "u1"))
        .await
        .expect("first initiate should succeed");

    // Wait until the first record has been expired and swept.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while engine.registry.get(&first.job_id).is_some() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "first job was never swept"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // The same idempotency key now creates a fresh job.
    let second = engine
        .service
        .initiate(crate::helpers::keyed_request("abc", "u1"))
        .await
        .expect("second initiate should succeed");
    assert_ne!(second.job_id, first.job_id);

    engine.stop().await;
}
