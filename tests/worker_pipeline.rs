//! End-to-end pipeline tests: intake through the worker loop to a
//! terminal audit status, with fake engines in place of real browsers.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{FakeAuditor, FakeScraper};
use tokio_util::sync::CancellationToken;

use sitepulse::{
    AuditIntake, AuditJobMessage, AuditProcessor, AuditStatus, AuditStore, AuditWorker,
    QueueOptions, SqliteAuditStore, SqliteJobQueue, WorkerOptions,
};

struct Pipeline {
    store: Arc<SqliteAuditStore>,
    queue: Arc<SqliteJobQueue>,
    scraper: Arc<FakeScraper>,
    auditor: Arc<FakeAuditor>,
    worker: Arc<AuditWorker>,
}

async fn pipeline(scraper: FakeScraper, auditor: FakeAuditor, max_attempts: i64) -> Pipeline {
    let store = Arc::new(
        SqliteAuditStore::connect("sqlite::memory:")
            .await
            .expect("in-memory store"),
    );
    let queue = Arc::new(
        SqliteJobQueue::connect_with(
            "sqlite::memory:",
            QueueOptions {
                max_attempts,
                retry_delay: Duration::from_millis(0),
                lease_duration: Duration::from_secs(30),
            },
        )
        .await
        .expect("in-memory queue"),
    );

    let scraper = Arc::new(scraper);
    let auditor = Arc::new(auditor);
    let processor = Arc::new(AuditProcessor::new(
        store.clone(),
        scraper.clone(),
        auditor.clone(),
    ));
    let worker = Arc::new(AuditWorker::new(
        queue.clone(),
        processor,
        WorkerOptions {
            worker_id: "worker-test".into(),
            concurrency: 2,
            poll_interval: Duration::from_millis(10),
        },
    ));

    Pipeline {
        store,
        queue,
        scraper,
        auditor,
        worker,
    }
}

async fn wait_for_status(
    store: &SqliteAuditStore,
    audit_id: &str,
    wanted: AuditStatus,
) -> AuditStatus {
    for _ in 0..200 {
        let record = store.find_by_id(audit_id).await.unwrap().unwrap();
        if record.status == wanted {
            return record.status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    store.find_by_id(audit_id).await.unwrap().unwrap().status
}

#[tokio::test]
async fn accepted_audit_reaches_completed_through_the_worker() {
    let p = pipeline(FakeScraper::succeeding(), FakeAuditor::succeeding(), 3).await;
    let intake = AuditIntake::new(p.store.clone(), p.queue.clone());

    let record = intake.create_audit("  https://example.com  ").await.unwrap();
    assert_eq!(record.status, AuditStatus::Pending);
    assert_eq!(record.url, "https://example.com/");

    let shutdown = CancellationToken::new();
    let worker = p.worker.clone();
    let run = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    let status = wait_for_status(&p.store, &record.id, AuditStatus::Completed).await;
    assert_eq!(status, AuditStatus::Completed);
    assert_eq!(p.scraper.call_count(), 1);
    assert_eq!(p.auditor.call_count(), 1);

    shutdown.cancel();
    run.await.unwrap();
}

#[tokio::test]
async fn blank_message_is_rejected_without_touching_the_processor() {
    let p = pipeline(FakeScraper::succeeding(), FakeAuditor::succeeding(), 3).await;
    let job_id = p.queue.submit(&AuditJobMessage::new("   ")).await.unwrap();

    let shutdown = CancellationToken::new();
    let worker = p.worker.clone();
    let run = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    for _ in 0..200 {
        if p.queue.job_status(&job_id).await.unwrap().as_deref() == Some("rejected") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(
        p.queue.job_status(&job_id).await.unwrap().as_deref(),
        Some("rejected")
    );
    assert_eq!(p.scraper.call_count(), 0);

    shutdown.cancel();
    run.await.unwrap();
}

#[tokio::test]
async fn engine_failure_marks_failed_and_the_worker_keeps_serving() {
    let p = pipeline(FakeScraper::failing(), FakeAuditor::succeeding(), 1).await;
    let intake = AuditIntake::new(p.store.clone(), p.queue.clone());

    let failing = intake.create_audit("https://broken.example").await.unwrap();

    let shutdown = CancellationToken::new();
    let worker = p.worker.clone();
    let run = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    let status = wait_for_status(&p.store, &failing.id, AuditStatus::Failed).await;
    assert_eq!(status, AuditStatus::Failed);

    // Recover the engine; the worker must still be alive to serve the
    // next audit.
    p.scraper.fail.store(false, Ordering::SeqCst);
    let next = intake.create_audit("https://example.com").await.unwrap();

    let status = wait_for_status(&p.store, &next.id, AuditStatus::Completed).await;
    assert_eq!(status, AuditStatus::Completed);

    shutdown.cancel();
    run.await.unwrap();
}

#[tokio::test]
async fn missing_audit_record_rejects_the_job() {
    let p = pipeline(FakeScraper::succeeding(), FakeAuditor::succeeding(), 3).await;
    let job_id = p
        .queue
        .submit(&AuditJobMessage::new("no-such-audit"))
        .await
        .unwrap();

    let shutdown = CancellationToken::new();
    let worker = p.worker.clone();
    let run = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    for _ in 0..200 {
        if p.queue.job_status(&job_id).await.unwrap().as_deref() == Some("rejected") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(
        p.queue.job_status(&job_id).await.unwrap().as_deref(),
        Some("rejected")
    );

    shutdown.cancel();
    run.await.unwrap();
}
