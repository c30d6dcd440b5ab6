//! Tests for the status polling engine.
//!
//! All timing-sensitive tests run with a paused tokio clock so sleeps
//! auto-advance and the wait bound can be asserted exactly.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use uj_api_contract::{JobKind, JobStatus};
use uj_core::{ObserverError, TaskHandle, WaitOpts};
use uj_rest_client_mock::{JobBuilder, MockTaskService, ScriptedJob};

fn service() -> Arc<MockTaskService> {
    Arc::new(MockTaskService::new())
}

#[tokio::test(start_paused = true)]
async fn wait_until_completed_returns_the_terminal_snapshot() {
    let service = service();
    let created = Utc::now();
    service.register_job(
        1,
        ScriptedJob::new(vec![
            JobBuilder::new(1, JobKind::Job, created).status(JobStatus::Pending).build(),
            JobBuilder::new(1, JobKind::Job, created).status(JobStatus::Running).build(),
            JobBuilder::new(1, JobKind::Job, created).status(JobStatus::Successful).build(),
        ]),
    );

    let mut handle = TaskHandle::observe(service, 1).await.unwrap();
    let job = handle.wait_until_completed().await.unwrap();
    assert_eq!(job.status, JobStatus::Successful);
    assert!(job.is_successful());
    // The handle's own view was replaced wholesale.
    assert_eq!(handle.snapshot(), &job);
}

#[tokio::test(start_paused = true)]
async fn wait_until_started_accepts_any_post_queue_status() {
    let service = service();
    let created = Utc::now();
    service.register_job(
        2,
        ScriptedJob::new(vec![
            JobBuilder::new(2, JobKind::ProjectUpdate, created).status(JobStatus::New).build(),
            JobBuilder::new(2, JobKind::ProjectUpdate, created).status(JobStatus::Waiting).build(),
            JobBuilder::new(2, JobKind::ProjectUpdate, created).status(JobStatus::Running).build(),
        ]),
    );

    let mut handle = TaskHandle::observe(service, 2).await.unwrap();
    let job = handle.wait_until_started().await.unwrap();
    assert_eq!(job.status, JobStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_bounded_by_one_poll_interval() {
    let service = service();
    // Stuck in running forever.
    service.register_job(
        3,
        ScriptedJob::new(vec![JobBuilder::new(3, JobKind::Job, Utc::now())
            .status(JobStatus::Running)
            .build()]),
    );

    let mut handle = TaskHandle::observe(service, 3).await.unwrap();
    let timeout = Duration::from_secs(5);
    let interval = Duration::from_secs(1);
    let opts = WaitOpts::completed().with_timeout(timeout).with_interval(interval);

    let err = handle.wait_until_status(&[JobStatus::Successful], opts).await.unwrap_err();
    match err {
        ObserverError::Timeout { last, elapsed } => {
            assert_eq!(last.status, JobStatus::Running);
            assert!(elapsed >= timeout, "elapsed {:?} below budget", elapsed);
            assert!(
                elapsed < timeout + interval,
                "elapsed {:?} overshot by more than one interval",
                elapsed
            );
        }
        other => panic!("expected Timeout, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn budget_is_measured_from_the_created_timestamp() {
    let service = service();
    // Created 30s before polling begins: only half the 60s budget is
    // left.
    let created = Utc::now() - ChronoDuration::seconds(30);
    service.register_job(
        4,
        ScriptedJob::new(vec![JobBuilder::new(4, JobKind::InventoryUpdate, created)
            .status(JobStatus::Pending)
            .build()]),
    );

    let mut handle = TaskHandle::observe(service, 4).await.unwrap();
    let opts = WaitOpts::completed()
        .with_timeout(Duration::from_secs(60))
        .with_interval(Duration::from_secs(1));

    let err = handle.wait_until_status(&JobStatus::TERMINAL, opts).await.unwrap_err();
    match err {
        ObserverError::Timeout { elapsed, .. } => {
            assert!(elapsed >= Duration::from_secs(60));
            // Roughly 30s of pre-poll time plus ~30 polls; nowhere near
            // the full 60 polls a fresh task would get.
            assert!(elapsed < Duration::from_secs(62));
        }
        other => panic!("expected Timeout, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn target_status_wins_even_with_an_exhausted_budget() {
    let service = service();
    let created = Utc::now() - ChronoDuration::seconds(120);
    service.register_job(
        5,
        ScriptedJob::new(vec![JobBuilder::new(5, JobKind::Job, created)
            .status(JobStatus::Successful)
            .build()]),
    );

    let mut handle = TaskHandle::observe(service, 5).await.unwrap();
    let opts = WaitOpts::completed().with_timeout(Duration::from_secs(60));
    let job = handle.wait_until_status(&JobStatus::TERMINAL, opts).await.unwrap();
    assert_eq!(job.status, JobStatus::Successful);
}

#[tokio::test(start_paused = true)]
async fn caller_supplied_reference_overrides_created() {
    let service = service();
    let created = Utc::now() - ChronoDuration::seconds(3600);
    service.register_job(
        6,
        ScriptedJob::new(vec![
            JobBuilder::new(6, JobKind::Job, created).status(JobStatus::Running).build(),
            JobBuilder::new(6, JobKind::Job, created).status(JobStatus::Successful).build(),
        ]),
    );

    let mut handle = TaskHandle::observe(service, 6).await.unwrap();
    // With the created-based default this would time out instantly; an
    // explicit reference restores the full budget.
    let opts = WaitOpts::completed()
        .with_interval(Duration::from_secs(1))
        .since(Utc::now());
    let job = handle.wait_until_completed_opts(opts).await.unwrap();
    assert_eq!(job.status, JobStatus::Successful);
}

#[tokio::test(start_paused = true)]
async fn started_helper_honors_overridden_bounds() {
    let service = service();
    // Stuck in the queue: waiting does not count as started.
    service.register_job(
        10,
        ScriptedJob::new(vec![JobBuilder::new(10, JobKind::Job, Utc::now())
            .status(JobStatus::Waiting)
            .build()]),
    );

    let mut handle = TaskHandle::observe(service, 10).await.unwrap();
    let opts = WaitOpts::started().with_timeout(Duration::from_secs(3));
    let err = handle.wait_until_started_opts(opts).await.unwrap_err();
    match err {
        ObserverError::Timeout { last, elapsed } => {
            assert_eq!(last.status, JobStatus::Waiting);
            assert!(elapsed >= Duration::from_secs(3));
            assert!(elapsed < Duration::from_secs(4));
        }
        other => panic!("expected Timeout, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn empty_target_set_is_rejected() {
    let service = service();
    service.register_job(
        7,
        ScriptedJob::new(vec![JobBuilder::new(7, JobKind::Job, Utc::now())
            .status(JobStatus::Running)
            .build()]),
    );

    let mut handle = TaskHandle::observe(service, 7).await.unwrap();
    let err = handle.wait_until_status(&[], WaitOpts::completed()).await.unwrap_err();
    assert!(matches!(err, ObserverError::EmptyTargetSet));
}

#[tokio::test(start_paused = true)]
async fn refresh_is_idempotent_without_server_side_change() {
    let service = service();
    service.register_job(
        8,
        ScriptedJob::new(vec![JobBuilder::new(8, JobKind::Job, Utc::now())
            .status(JobStatus::Running)
            .build()]),
    );

    let mut handle = TaskHandle::observe(service, 8).await.unwrap();
    let first = handle.refresh().await.unwrap();
    let second = handle.refresh().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn terminal_snapshots_stay_terminal_across_refreshes() {
    let service = service();
    let created = Utc::now();
    service.register_job(
        9,
        ScriptedJob::new(vec![
            JobBuilder::new(9, JobKind::Job, created).status(JobStatus::Pending).build(),
            JobBuilder::new(9, JobKind::Job, created)
                .status(JobStatus::Canceled)
                .failed(true)
                .build(),
        ]),
    );

    let mut handle = TaskHandle::observe(service, 9).await.unwrap();
    let job = handle.wait_until_completed().await.unwrap();
    assert!(job.is_completed());

    for _ in 0..3 {
        let again = handle.refresh().await.unwrap();
        assert!(again.is_completed());
        assert_eq!(again.status, JobStatus::Canceled);
    }
}
