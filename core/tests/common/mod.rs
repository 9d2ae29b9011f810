#![allow(dead_code)]

use fingenius_core::documents::model::{DocumentId, LifecycleState, OwnerId};
use fingenius_core::extraction::fixture::FixtureAdapter;
use fingenius_core::extraction::interface::{RawExtraction, RawHeader, RawLineItem};
use fingenius_core::{DocumentManager, PipelineConfig};
use std::sync::Arc;

pub fn pdf(tag: &str) -> Vec<u8> {
    format!("%PDF-1.7\n% {}\n", tag).into_bytes()
}

pub fn owner(id: &str) -> OwnerId {
    OwnerId::from(id)
}

pub fn statement(period: Option<(&str, &str)>, lines: &[(&str, &str, &str)]) -> RawExtraction {
    RawExtraction {
        header: RawHeader {
            account_identifier: Some("XXXX-4321".to_string()),
            period_start: period.map(|p| p.0.to_string()),
            period_end: period.map(|p| p.1.to_string()),
            ..RawHeader::default()
        },
        line_items: lines
            .iter()
            .map(|(d, a, desc)| RawLineItem::new(d, a, desc))
            .collect(),
    }
}

pub fn manager(adapter: Arc<FixtureAdapter>) -> Arc<DocumentManager> {
    manager_with(adapter, PipelineConfig::default())
}

pub fn manager_with(adapter: Arc<FixtureAdapter>, config: PipelineConfig) -> Arc<DocumentManager> {
    Arc::new(DocumentManager::new(config, adapter).unwrap())
}

/// Advances until the document reaches a terminal state.
pub async fn drive(manager: &DocumentManager, id: &DocumentId) -> LifecycleState {
    for _ in 0..10 {
        let state = manager.advance(id).await.unwrap();
        if state.is_terminal() {
            return state;
        }
    }
    panic!("document {} did not settle", id);
}

/// Registers and submits a credit card statement, returning its id.
pub fn submit_card_statement(
    manager: &DocumentManager,
    adapter: &FixtureAdapter,
    tag: &str,
    owner_id: &str,
    extraction: RawExtraction,
) -> DocumentId {
    let content = pdf(tag);
    adapter.register(&content, extraction);
    manager
        .submit(&content, "credit_card_statement", &owner(owner_id))
        .unwrap()
}
