//! Caller-facing operations: intake, status and dispute, as serde DTOs.

use crate::disputes::model::DisputeStatus;
use crate::documents::model::{
    DocumentId, ExtractedHeader, FailureReason, LifecycleState, TransactionId,
};
use crate::error::{CoreError, CoreResult, ErrorKind};
use crate::insights::model::Insight;
use crate::ledger::model::Transaction;
use crate::pipeline::manager::{DocumentManager, Submission};
use crate::pipeline::pool::WorkerPool;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default)]
pub struct IntakeRequest {
    pub owner_id: String,
    pub document_type: String,
    pub filename: Option<String>,
    pub description: Option<String>,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeResponse {
    pub document_id: DocumentId,
    pub state: LifecycleState,
}

/// Results are attached only once the document is `Ready`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub document_id: DocumentId,
    pub state: LifecycleState,
    pub failure_reason: Option<FailureReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<ExtractedHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<Vec<Insight>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DisputeRequest {
    pub document_id: String,
    pub transaction_id: String,
    pub reason_code: String,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisputeResponse {
    pub dispute_id: String,
    pub version: u32,
    pub status: DisputeStatus,
    pub letter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&CoreError> for ErrorBody {
    fn from(err: &CoreError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

pub struct PipelineApi {
    manager: Arc<DocumentManager>,
    pool: WorkerPool,
    inflight: DashMap<DocumentId, JoinHandle<CoreResult<LifecycleState>>>,
}

impl PipelineApi {
    pub fn new(manager: Arc<DocumentManager>) -> Self {
        let pool = WorkerPool::new(manager.config().worker_pool_size);
        Self {
            manager,
            pool,
            inflight: DashMap::new(),
        }
    }

    pub fn manager(&self) -> &Arc<DocumentManager> {
        &self.manager
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Accepts a document and starts processing it in the background.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since processing is
    /// spawned onto the current runtime.
    pub fn intake(&self, request: IntakeRequest) -> CoreResult<IntakeResponse> {
        self.prune_finished();
        let document_id = self.manager.submit_document(Submission {
            owner_id: request.owner_id,
            declared_type: request.document_type,
            content: request.content,
            filename: request.filename,
            description: request.description,
        })?;
        let handle = self
            .pool
            .dispatch(Arc::clone(&self.manager), document_id.clone());
        self.inflight.insert(document_id.clone(), handle);
        Ok(IntakeResponse {
            document_id,
            state: LifecycleState::Uploaded,
        })
    }

    /// Waits for background processing started by [`intake`](Self::intake).
    pub async fn settle(&self, document_id: &DocumentId) -> CoreResult<LifecycleState> {
        match self.inflight.remove(document_id) {
            Some((_, handle)) => handle
                .await
                .map_err(|e| CoreError::ExtractionFailure(format!("pipeline task aborted: {}", e)))?,
            None => self.manager.status(document_id).map(|s| s.state),
        }
    }

    /// Background tasks not yet finished or collected by `settle`.
    pub fn pending(&self) -> usize {
        self.prune_finished();
        self.inflight.len()
    }

    /// Drops handles of finished tasks; their outcome is on the document.
    fn prune_finished(&self) {
        self.inflight.retain(|_, handle| !handle.is_finished());
    }

    pub fn status(&self, document_id: &str) -> CoreResult<StatusResponse> {
        self.prune_finished();
        let id = DocumentId::from(document_id);
        let status = self.manager.status(&id)?;
        let mut response = StatusResponse {
            document_id: status.document_id,
            state: status.state,
            failure_reason: status.failure,
            header: None,
            transactions: None,
            insights: None,
        };
        if status.state == LifecycleState::Ready {
            let detail = self.manager.document_detail(&id)?;
            response.header = detail.header;
            response.transactions = Some(detail.transactions);
            response.insights = Some(detail.insights);
        }
        Ok(response)
    }

    pub fn dispute(&self, request: &DisputeRequest) -> CoreResult<DisputeResponse> {
        let case = self.manager.create_dispute(
            &DocumentId::from(request.document_id.as_str()),
            &TransactionId::from(request.transaction_id.as_str()),
            &request.reason_code,
            &request.detail,
        )?;
        Ok(DisputeResponse {
            dispute_id: case.id.to_string(),
            version: case.version,
            status: case.status,
            letter: case.letter,
        })
    }
}
