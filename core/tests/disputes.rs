mod common;

use common::*;
use fingenius_core::api::{DisputeRequest, IntakeRequest, PipelineApi};
use fingenius_core::disputes::model::DisputeStatus;
use fingenius_core::documents::model::{DocumentId, LifecycleState};
use fingenius_core::error::{CoreError, ErrorKind};
use fingenius_core::extraction::fixture::FixtureAdapter;
use std::sync::Arc;

async fn ready_document(
    adapter: &Arc<FixtureAdapter>,
    mgr: &fingenius_core::DocumentManager,
) -> DocumentId {
    let id = submit_card_statement(
        mgr,
        adapter,
        "dispute",
        "owner-1",
        statement(
            Some(("2026-03-01", "2026-03-31")),
            &[("2026-03-12", "249.00", "GADGETWORLD ONLINE")],
        ),
    );
    assert_eq!(drive(mgr, &id).await, LifecycleState::Ready);
    id
}

#[tokio::test]
async fn letters_are_deterministic_and_versioned() {
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    let mgr = manager(Arc::clone(&adapter));
    let doc = ready_document(&adapter, &mgr).await;
    let tx = mgr.document_detail(&doc).unwrap().transactions[0].clone();

    let first = mgr
        .create_dispute(&doc, tx.id(), "product_not_received", "Ordered on March 1, never arrived.")
        .unwrap();
    let again = mgr
        .create_dispute(&doc, tx.id(), "product_not_received", "Ordered on March 1, never arrived.")
        .unwrap();
    assert_eq!(first.letter, again.letter);
    assert_ne!(first.id, again.id);
    assert_eq!(first.version, 1);
    assert_eq!(first.status, DisputeStatus::Draft);
    assert!(first.letter.starts_with("[Your Name]"));
    assert!(first.letter.contains("[Date]"));
    assert!(first.letter.contains("$249.00"));
    assert!(first.letter.contains("2026-03-12"));
    assert!(first.letter.contains("XXXX-4321"));
    assert!(first.letter.contains("never arrived"));

    let revised = mgr
        .regenerate_dispute(&first.id, Some("unauthorized_charge"), None)
        .unwrap();
    assert_eq!(revised.version, 2);
    assert_eq!(revised.supersedes, Some(first.id.clone()));
    assert_eq!(revised.detail, first.detail);
    assert_ne!(revised.letter, first.letter);
    assert_eq!(mgr.dispute(&first.id).unwrap().letter, first.letter);
    assert_eq!(mgr.disputes_for_document(&doc).unwrap().len(), 3);
}

#[tokio::test]
async fn unknown_reason_code_is_rejected() {
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    let mgr = manager(Arc::clone(&adapter));
    let doc = ready_document(&adapter, &mgr).await;
    let tx = mgr.document_detail(&doc).unwrap().transactions[0].clone();

    let err = mgr
        .create_dispute(&doc, tx.id(), "defective_merchandise", "")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(mgr.disputes_for_document(&doc).unwrap().is_empty());

    let missing = fingenius_core::documents::model::TransactionId::from("nope");
    assert!(matches!(
        mgr.create_dispute(&doc, &missing, "other", ""),
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn dispute_status_only_moves_forward() {
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    let mgr = manager(Arc::clone(&adapter));
    let doc = ready_document(&adapter, &mgr).await;
    let tx = mgr.document_detail(&doc).unwrap().transactions[0].clone();
    let case = mgr.create_dispute(&doc, tx.id(), "duplicate_charge", "").unwrap();
    assert!(case.letter.contains("(none provided)"));

    let sent = mgr.update_dispute_status(&case.id, DisputeStatus::Sent).unwrap();
    assert_eq!(sent.status, DisputeStatus::Sent);
    assert!(matches!(
        mgr.update_dispute_status(&case.id, DisputeStatus::Draft),
        Err(CoreError::InvalidTransition(_))
    ));
    let resolved = mgr
        .update_dispute_status(&case.id, DisputeStatus::Resolved)
        .unwrap();
    assert_eq!(resolved.status, DisputeStatus::Resolved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn api_round_trip_from_intake_to_dispute() {
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    let content = pdf("api");
    adapter.register(
        &content,
        statement(None, &[("2026-03-12", "89.99", "Best Buy 0042")]),
    );
    let api = PipelineApi::new(manager(Arc::clone(&adapter)));

    let accepted = api
        .intake(IntakeRequest {
            owner_id: "owner-1".to_string(),
            document_type: "credit_card_statement".to_string(),
            filename: Some("march.pdf".to_string()),
            description: Some("March card".to_string()),
            content,
        })
        .unwrap();
    assert_eq!(accepted.state, LifecycleState::Uploaded);
    assert_eq!(api.settle(&accepted.document_id).await.unwrap(), LifecycleState::Ready);

    let status = api.status(accepted.document_id.as_str()).unwrap();
    assert_eq!(status.failure_reason, None);
    let txns = status.transactions.unwrap();
    assert_eq!(txns.len(), 1);
    assert!(status.insights.is_some());

    let response = api
        .dispute(&DisputeRequest {
            document_id: accepted.document_id.to_string(),
            transaction_id: txns[0].id().to_string(),
            reason_code: "defective_product".to_string(),
            detail: "Screen cracked on arrival.".to_string(),
        })
        .unwrap();
    assert_eq!(response.version, 1);
    assert_eq!(response.status, DisputeStatus::Draft);
    assert!(response.letter.contains("Screen cracked on arrival."));

    let rejected = api.intake(IntakeRequest {
        owner_id: "owner-1".to_string(),
        document_type: "tax_return".to_string(),
        content: pdf("other"),
        ..IntakeRequest::default()
    });
    assert_eq!(rejected.unwrap_err().kind(), ErrorKind::InvalidInput);
    assert!(matches!(api.status("missing"), Err(CoreError::NotFound(_))));
}
