//! Client cancellation semantics.

use std::time::Duration;

use bundlehub_entity::job::JobStatus;
use bundlehub_service::Resolution;

use crate::helpers::{TestEngine, fast_config, single_file_request};

#[tokio::test]
async fn test_cancel_mid_run_stops_before_staging() {
    let mut config = fast_config();
    config.jobs.delay_min_ms = 5_000;
    config.jobs.delay_max_ms = 5_000;
    let engine = TestEngine::start(config, Vec::new()).await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");

    // Let a worker claim the job and start ticking.
    engine
        .wait_for(receipt.job_id, Duration::from_secs(2), |job| {
            job.status == JobStatus::Running
        })
        .await;

    let snapshot = engine
        .service
        .cancel(&receipt.job_id)
        .expect("cancel should find the job");
    assert_eq!(snapshot.status, JobStatus::Cancelled);

    // The worker must observe the cancellation at the next tick and
    // abandon without ever invoking the stager.
    tokio::time::sleep(Duration::from_millis(600)).await;
    let job = engine
        .registry
        .get(&receipt.job_id)
        .expect("record still present");
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(job.progress_percent < 100);
    assert_eq!(engine.store.put_count(), 0);
    assert!(job.result.is_none());

    engine.stop().await;
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let mut config = fast_config();
    config.jobs.delay_min_ms = 5_000;
    config.jobs.delay_max_ms = 5_000;
    let engine = TestEngine::start(config, Vec::new()).await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");

    let first = engine.service.cancel(&receipt.job_id).expect("job exists");
    let second = engine.service.cancel(&receipt.job_id).expect("job exists");

    assert_eq!(first.status, JobStatus::Cancelled);
    assert_eq!(second.status, JobStatus::Cancelled);
    assert_eq!(first.completed_at, second.completed_at);
    assert_eq!(first.updated_at, second.updated_at);

    engine.stop().await;
}

#[tokio::test]
async fn test_cancelled_job_resolves_gone() {
    let engine = TestEngine::start(fast_config(), Vec::new()).await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");
    engine.service.cancel(&receipt.job_id);

    let job = engine
        .wait_for_terminal(receipt.job_id, Duration::from_secs(2))
        .await;
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(matches!(
        engine.service.resolve(&receipt.job_id),
        Resolution::Gone(_)
    ));

    engine.stop().await;
}

#[tokio::test]
async fn test_completed_job_survives_cancel() {
    let engine = TestEngine::start(fast_config(), Vec::new()).await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");
    let completed = engine
        .wait_for_terminal(receipt.job_id, Duration::from_secs(5))
        .await;
    assert_eq!(completed.status, JobStatus::Completed);

    // Cancel after completion is a no-op.
    let snapshot = engine
        .service
        .cancel(&receipt.job_id)
        .expect("job still known");
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.result, completed.result);

    engine.stop().await;
}
