mod common;

use common::*;
use fingenius_core::api::{IntakeRequest, PipelineApi};
use fingenius_core::documents::model::{LifecycleState, PipelineStep};
use fingenius_core::error::{CoreError, ErrorKind};
use fingenius_core::extraction::fixture::FixtureAdapter;
use fingenius_core::pipeline::pool::WorkerPool;
use fingenius_core::PipelineConfig;
use std::sync::Arc;
use std::time::Duration;

fn slow_adapter(ms: u64) -> Arc<FixtureAdapter> {
    Arc::new(FixtureAdapter::new("slow").with_latency(Duration::from_millis(ms)))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_advances_on_one_document_conflict() {
    let adapter = slow_adapter(400);
    let mgr = manager(Arc::clone(&adapter));
    let id = submit_card_statement(
        &mgr,
        &adapter,
        "race",
        "owner-1",
        statement(None, &[("2026-03-02", "10.00", "Starbucks")]),
    );

    let mut handles = Vec::new();
    for _ in 0..4 {
        let mgr = Arc::clone(&mgr);
        let id = id.clone();
        handles.push(tokio::spawn(async move { mgr.advance(&id).await }));
    }
    let mut ok = 0;
    let mut conflicts = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(state) => {
                assert_eq!(state, LifecycleState::Extracting);
                ok += 1;
            }
            Err(CoreError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 3);
    assert_eq!(drive(&mgr, &id).await, LifecycleState::Ready);
}

#[tokio::test]
async fn slow_extraction_times_out() {
    let adapter = slow_adapter(2_000);
    let config = PipelineConfig::default().with_extraction_timeout(Duration::from_millis(50));
    let mgr = manager_with(Arc::clone(&adapter), config);
    let id = submit_card_statement(&mgr, &adapter, "slow", "owner-1", statement(None, &[]));

    assert_eq!(mgr.advance(&id).await.unwrap(), LifecycleState::Failed);
    let failure = mgr.status(&id).unwrap().failure.unwrap();
    assert_eq!(failure.kind, ErrorKind::ExtractionTimeout);
    assert_eq!(failure.step, PipelineStep::Extraction);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_interrupts_inflight_extraction() {
    let adapter = slow_adapter(5_000);
    let mgr = manager(Arc::clone(&adapter));
    let id = submit_card_statement(&mgr, &adapter, "cancel", "owner-1", statement(None, &[]));

    let running = {
        let mgr = Arc::clone(&mgr);
        let id = id.clone();
        tokio::spawn(async move { mgr.advance(&id).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    // The state seen when the request arrived, whichever side wins the lock.
    assert_eq!(mgr.cancel(&id).unwrap(), LifecycleState::Extracting);

    let finished = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("cancel should interrupt the adapter call")
        .unwrap()
        .unwrap();
    assert_eq!(finished, LifecycleState::Failed);
    let failure = mgr.status(&id).unwrap().failure.unwrap();
    assert_eq!(failure.kind, ErrorKind::Cancelled);
    assert_eq!(failure.step, PipelineStep::Extraction);
    assert_eq!(mgr.cancel(&id).unwrap(), LifecycleState::Failed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_drives_many_documents_to_ready() {
    let adapter = Arc::new(FixtureAdapter::new("fixture").with_latency(Duration::from_millis(10)));
    let mgr = manager(Arc::clone(&adapter));
    let pool = WorkerPool::new(3);

    let mut handles = Vec::new();
    for n in 0..10 {
        let owner_id = format!("owner-{}", n % 3);
        let id = submit_card_statement(
            &mgr,
            &adapter,
            &format!("pool-{}", n),
            &owner_id,
            statement(
                None,
                &[
                    ("2026-03-02", "42.00", "Kroger 221"),
                    ("2026-03-09", "12.50", "Lyft ride"),
                ],
            ),
        );
        handles.push(pool.dispatch(Arc::clone(&mgr), id));
    }
    for h in handles {
        assert_eq!(h.await.unwrap().unwrap(), LifecycleState::Ready);
    }
    let stats = pool.stats();
    assert_eq!(stats.dispatched, 10);
    assert_eq!(stats.ready, 10);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.stages_run, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_waits_out_a_conflicting_advance() {
    let adapter = slow_adapter(300);
    let mgr = manager(Arc::clone(&adapter));
    let id = submit_card_statement(
        &mgr,
        &adapter,
        "contended",
        "owner-1",
        statement(None, &[("2026-03-02", "10.00", "Starbucks")]),
    );

    let manual = {
        let mgr = Arc::clone(&mgr);
        let id = id.clone();
        tokio::spawn(async move { mgr.advance(&id).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let pool = WorkerPool::new(2);
    let driven = pool.dispatch(Arc::clone(&mgr), id.clone());
    assert_eq!(driven.await.unwrap().unwrap(), LifecycleState::Ready);
    assert_eq!(manual.await.unwrap().unwrap(), LifecycleState::Extracting);

    assert_eq!(mgr.status(&id).unwrap().state, LifecycleState::Ready);
    let stats = pool.stats();
    assert!(stats.conflicts >= 1);
    assert_eq!(stats.ready, 1);
    assert_eq!(stats.stages_run, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn finished_intakes_do_not_accumulate() {
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    let api = PipelineApi::new(manager(Arc::clone(&adapter)));

    let mut ids = Vec::new();
    for n in 0..3 {
        let content = pdf(&format!("polled-{}", n));
        adapter.register(&content, statement(None, &[("2026-03-02", "9.99", "Netflix")]));
        let accepted = api
            .intake(IntakeRequest {
                owner_id: "owner-1".to_string(),
                document_type: "credit_card_statement".to_string(),
                content,
                ..IntakeRequest::default()
            })
            .unwrap();
        ids.push(accepted.document_id);
    }

    // Poll status only, never settle.
    for id in &ids {
        let mut polls = 0;
        while !api.status(id.as_str()).unwrap().state.is_terminal() {
            polls += 1;
            assert!(polls < 200, "document {} did not finish", id);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
    for _ in 0..100 {
        if api.pending() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(api.pending(), 0);
    assert_eq!(api.settle(&ids[0]).await.unwrap(), LifecycleState::Ready);
}
