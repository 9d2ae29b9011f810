use super::cancel::CancelSignal;
use crate::documents::model::{DisputeId, Document, ExtractedHeader, LifecycleState};
use crate::extraction::interface::RawExtraction;
use crate::insights::model::Insight;
use crate::ledger::model::Transaction;
use parking_lot::RwLock;
use std::sync::Arc;

/// Everything the pipeline has produced for one document so far.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub document: Document,
    pub content: Arc<[u8]>,
    pub raw: Option<RawExtraction>,
    pub header: Option<ExtractedHeader>,
    pub transactions: Vec<Transaction>,
    pub insights: Vec<Insight>,
    pub insight_generation: u32,
    pub disputes: Vec<DisputeId>,
}

impl DocumentRecord {
    pub fn new(document: Document, content: Arc<[u8]>) -> Self {
        Self {
            document,
            content,
            raw: None,
            header: None,
            transactions: Vec::new(),
            insights: Vec::new(),
            insight_generation: 0,
            disputes: Vec::new(),
        }
    }
}

/// Per-document slot: the advisory run lock, the cancel flag and the record.
#[derive(Debug)]
pub struct DocumentSlot {
    pub(crate) run_lock: Arc<tokio::sync::Mutex<()>>,
    pub(crate) cancel: CancelSignal,
    pub(crate) record: RwLock<DocumentRecord>,
}

impl DocumentSlot {
    pub fn new(record: DocumentRecord) -> Self {
        Self {
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
            cancel: CancelSignal::new(),
            record: RwLock::new(record),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.record.read().document.state
    }

    pub fn document(&self) -> Document {
        self.record.read().document.clone()
    }
}
