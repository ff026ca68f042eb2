//! Transient-failure retry behavior.

use std::time::Duration;

use bundlehub_core::traits::storage::StorageError;
use bundlehub_entity::job::JobStatus;
use bundlehub_service::Resolution;

use crate::helpers::{TestEngine, fast_config, single_file_request};

#[tokio::test]
async fn test_two_transient_failures_then_success() {
    let engine = TestEngine::start(
        fast_config(),
        vec![
            StorageError::Unreachable("storage offline".to_string()),
            StorageError::Backend("write rejected".to_string()),
        ],
    )
    .await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");
    let job = engine
        .wait_for_terminal(receipt.job_id, Duration::from_secs(10))
        .await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.attempts, 3);
    assert!(job.result.is_some());
    assert!(job.error.is_none());
    assert_eq!(engine.store.put_count(), 3);

    engine.stop().await;
}

#[tokio::test]
async fn test_exhausted_retries_fail_with_last_cause() {
    let mut config = fast_config();
    config.worker.max_attempts = 2;
    let engine = TestEngine::start(
        config,
        vec![
            StorageError::Unreachable("down".to_string()),
            StorageError::Unreachable("still down".to_string()),
            StorageError::Unreachable("never up".to_string()),
        ],
    )
    .await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");
    let job = engine
        .wait_for_terminal(receipt.job_id, Duration::from_secs(10))
        .await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.attempts, 2);
    let failure = job.error.expect("failed job carries an error");
    assert_eq!(failure.code, "transient");
    assert!(failure.message.contains("still down"));
    assert!(job.result.is_none());

    // A terminal failure resolves Gone, not NotFound.
    assert!(matches!(
        engine.service.resolve(&receipt.job_id),
        Resolution::Gone(_)
    ));

    engine.stop().await;
}

#[tokio::test]
async fn test_permanent_failure_does_not_retry() {
    let engine = TestEngine::start(
        fast_config(),
        vec![StorageError::InvalidKey("malformed".to_string())],
    )
    .await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");
    let job = engine
        .wait_for_terminal(receipt.job_id, Duration::from_secs(5))
        .await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.attempts, 1);
    assert_eq!(job.error.expect("error populated").code, "permanent");
    assert_eq!(engine.store.put_count(), 1);

    engine.stop().await;
}

#[tokio::test]
async fn test_progress_resets_between_attempts() {
    let engine = TestEngine::start(
        fast_config(),
        vec![StorageError::Unreachable("blip".to_string())],
    )
    .await;

    let receipt = engine
        .service
        .initiate(single_file_request())
        .await
        .expect("initiate should succeed");
    let job = engine
        .wait_for_terminal(receipt.job_id, Duration::from_secs(10))
        .await;

    // After the retry the job still ends at 100 with a clean result.
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.attempts, 2);
    assert_eq!(job.progress_percent, 100);

    engine.stop().await;
}
