//! Deduplication of resubmitted downloads.

use std::time::Duration;

use bundlehub_entity::job::JobStatus;

use crate::helpers::{TestEngine, fast_config, keyed_request};

#[tokio::test]
async fn test_duplicate_submissions_share_one_job() {
    let engine = TestEngine::start(fast_config(), Vec::new()).await;

    let first = engine
        .service
        .initiate(keyed_request("abc", "u1"))
        .await
        .expect("first initiate should succeed");

    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = engine
        .service
        .initiate(keyed_request("abc", "u1"))
        .await
        .expect("second initiate should succeed");

    assert_eq!(first.job_id, second.job_id);
    assert_eq!(engine.registry.len(), 1);

    engine.stop().await;
}

#[tokio::test]
async fn test_duplicate_after_completion_returns_same_job() {
    let engine = TestEngine::start(fast_config(), Vec::new()).await;

    let first = engine
        .service
        .initiate(keyed_request("abc", "u1"))
        .await
        .expect("initiate should succeed");
    let job = engine
        .wait_for_terminal(first.job_id, Duration::from_secs(5))
        .await;
    assert_eq!(job.status, JobStatus::Completed);

    let resubmit = engine
        .service
        .initiate(keyed_request("abc", "u1"))
        .await
        .expect("resubmission should succeed");

    assert_eq!(resubmit.job_id, first.job_id);
    assert_eq!(resubmit.status, JobStatus::Completed);
    assert_eq!(engine.registry.len(), 1);
    // The completed job was not enqueued again.
    assert!(engine.queue.is_empty().await);

    engine.stop().await;
}

#[tokio::test]
async fn test_concurrent_duplicates_collapse_to_one_job() {
    let engine = TestEngine::start(fast_config(), Vec::new()).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = engine.service.clone();
        handles.push(tokio::spawn(async move {
            service
                .initiate(keyed_request("race", "u1"))
                .await
                .expect("initiate should succeed")
                .job_id
        }));
    }

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        ids.insert(handle.await.expect("task should join"));
    }

    assert_eq!(ids.len(), 1, "all callers must observe the same job");
    assert_eq!(engine.registry.len(), 1);

    engine.stop().await;
}

#[tokio::test]
async fn test_distinct_users_get_distinct_jobs() {
    let engine = TestEngine::start(fast_config(), Vec::new()).await;

    let first = engine
        .service
        .initiate(keyed_request("abc", "u1"))
        .await
        .unwrap();
    let second = engine
        .service
        .initiate(keyed_request("abc", "u2"))
        .await
        .unwrap();

    assert_ne!(first.job_id, second.job_id);
    assert_eq!(engine.registry.len(), 2);

    engine.stop().await;
}
