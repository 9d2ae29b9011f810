use super::lifecycle::{next_step, valid_transition};
use super::store::{DocumentRecord, DocumentSlot};
use crate::anomaly::baseline::BaselineStore;
use crate::anomaly::detector::AnomalyDetector;
use crate::audit::event::{Actor, AuditEvent, AuditEventType};
use crate::audit::log::AuditLog;
use crate::categorize::categorizer::{Categorizer, CategorySource, PrecedentMemory};
use crate::categorize::taxonomy::Category;
use crate::config::PipelineConfig;
use crate::determinism::ids::{dispute_id_ulid, document_id_ulid, sha256_hex};
use crate::determinism::json_canonical::cents;
use crate::disputes::composer::{DisputeComposer, LetterFacts};
use crate::disputes::model::{DisputeCase, DisputeStatus};
use crate::documents::media::detect_media_type;
use crate::documents::model::{
    DisputeId, Document, DocumentId, DocumentMetadata, DocumentType, ExtractedHeader,
    FailureReason, LifecycleState, OwnerId, PipelineStep, TransactionId,
};
use crate::error::{CoreError, CoreResult};
use crate::extraction::interface::{ExtractionAdapter, ExtractionRequest};
use crate::extraction::runtime::ExtractionRuntime;
use crate::insights::generator::{InsightGenerator, InsightInput};
use crate::insights::history::{DocumentDigest, OwnerHistory};
use crate::insights::model::Insight;
use crate::ledger::export::render_transactions_csv;
use crate::ledger::model::Transaction;
use crate::ledger::normalizer::LineNormalizer;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;

/// An intake request with the optional metadata the caller may supply.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub owner_id: String,
    pub declared_type: String,
    pub content: Vec<u8>,
    pub filename: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentStatus {
    pub document_id: DocumentId,
    pub state: LifecycleState,
    pub failure: Option<FailureReason>,
}

/// Everything known about a document, including partial results of a failed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentDetail {
    pub document: Document,
    pub header: Option<ExtractedHeader>,
    pub transactions: Vec<Transaction>,
    pub insights: Vec<Insight>,
    pub disputes: Vec<DisputeCase>,
}

/// Owns every document's state machine and the components each stage runs.
pub struct DocumentManager {
    config: PipelineConfig,
    extraction: ExtractionRuntime,
    normalizer: LineNormalizer,
    categorizer: Categorizer,
    detector: AnomalyDetector,
    insights: InsightGenerator,
    composer: DisputeComposer,
    baselines: Arc<BaselineStore>,
    history: OwnerHistory,
    documents: DashMap<DocumentId, Arc<DocumentSlot>>,
    disputes: DashMap<DisputeId, DisputeCase>,
    audit: Mutex<AuditLog>,
}

impl DocumentManager {
    pub fn new(config: PipelineConfig, adapter: Arc<dyn ExtractionAdapter>) -> CoreResult<Self> {
        Self::with_shared_state(
            config,
            adapter,
            Arc::new(BaselineStore::new()),
            Arc::new(PrecedentMemory::default()),
        )
    }

    /// Builds a manager over baselines and category precedents owned elsewhere.
    pub fn with_shared_state(
        config: PipelineConfig,
        adapter: Arc<dyn ExtractionAdapter>,
        baselines: Arc<BaselineStore>,
        precedents: Arc<PrecedentMemory>,
    ) -> CoreResult<Self> {
        config.validate()?;
        let audit = match &config.audit_log_path {
            Some(path) => AuditLog::open_or_create(path)?,
            None => AuditLog::in_memory(),
        };
        tracing::info!(
            adapter = adapter.adapter_id(),
            timeout_ms = config.extraction_timeout_ms,
            workers = config.worker_pool_size,
            "document manager ready"
        );
        Ok(Self {
            extraction: ExtractionRuntime::new(adapter, config.extraction_timeout()),
            normalizer: LineNormalizer::new()?,
            categorizer: Categorizer::new(&config.categorizer, precedents)?,
            detector: AnomalyDetector::new(config.anomaly.clone()),
            insights: InsightGenerator::new(config.insights.clone()),
            composer: DisputeComposer::new(&config.disputes),
            baselines,
            history: OwnerHistory::default(),
            documents: DashMap::new(),
            disputes: DashMap::new(),
            audit: Mutex::new(audit),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn baselines(&self) -> &Arc<BaselineStore> {
        &self.baselines
    }

    pub fn audit_events(&self) -> CoreResult<Vec<AuditEvent>> {
        self.audit.lock().events()
    }

    pub fn submit(&self, content: &[u8], declared_type: &str, owner: &OwnerId) -> CoreResult<DocumentId> {
        self.submit_document(Submission {
            owner_id: owner.to_string(),
            declared_type: declared_type.to_string(),
            content: content.to_vec(),
            filename: None,
            description: None,
        })
    }

    /// Validates the payload and creates the document in `Uploaded`.
    /// Nothing is stored unless every check passes.
    pub fn submit_document(&self, submission: Submission) -> CoreResult<DocumentId> {
        let owner_id = submission.owner_id.trim();
        if owner_id.is_empty() {
            return Err(CoreError::InvalidInput("owner id is required".to_string()));
        }
        if submission.content.is_empty() {
            return Err(CoreError::InvalidInput("document payload is empty".to_string()));
        }
        let document_type: DocumentType = submission.declared_type.parse()?;
        let size_bytes = submission.content.len() as u64;
        if size_bytes > self.config.max_upload_bytes {
            return Err(CoreError::InvalidInput(format!(
                "document is {} bytes; the limit is {}",
                size_bytes, self.config.max_upload_bytes
            )));
        }
        let media_type = detect_media_type(&submission.content, submission.filename.as_deref())?;

        let sha256 = sha256_hex(&submission.content);
        let document = Document {
            id: DocumentId::new(document_id_ulid()),
            owner_id: OwnerId::new(owner_id),
            document_type,
            uploaded_at: OffsetDateTime::now_utc(),
            state: LifecycleState::Uploaded,
            failure: None,
            metadata: DocumentMetadata {
                filename: submission.filename,
                description: submission.description,
                media_type: Some(media_type),
                size_bytes,
                sha256: sha256.clone(),
                ..DocumentMetadata::default()
            },
        };
        let id = document.id.clone();
        let owner = document.owner_id.clone();
        let record = DocumentRecord::new(document, Arc::from(submission.content));
        self.documents
            .insert(id.clone(), Arc::new(DocumentSlot::new(record)));

        tracing::info!(
            document_id = %id,
            owner_id = %owner,
            document_type = document_type.as_str(),
            size_bytes,
            "document submitted"
        );
        self.record_event(
            AuditEventType::DocumentSubmitted,
            &id,
            &owner,
            Actor::User,
            json!({
                "document_type": document_type.as_str(),
                "media_type": media_type.as_str(),
                "size_bytes": size_bytes,
                "sha256": sha256,
            }),
        );
        Ok(id)
    }

    /// Drives the document one state forward and runs the component for the
    /// state entered. Stage failures come back as `Ok(Failed)`; only an
    /// unknown id or an in-flight run on the same document is an `Err`.
    pub async fn advance(&self, id: &DocumentId) -> CoreResult<LifecycleState> {
        let slot = self.slot(id)?;
        let _run = Arc::clone(&slot.run_lock)
            .try_lock_owned()
            .map_err(|_| CoreError::Conflict(format!("document {} is already advancing", id)))?;

        let current = slot.state();
        let Some((next, step)) = next_step(current) else {
            return Ok(current);
        };
        if slot.cancel.is_cancelled() {
            return Ok(self.fail(&slot, step, CoreError::Cancelled));
        }

        let outcome = match step {
            PipelineStep::Extraction => match self.set_state(&slot, next, step) {
                Ok(()) => self.extract(&slot).await,
                Err(err) => Err(err),
            },
            _ => self.run_sync_stage(&slot, next, step),
        };

        match outcome {
            Ok(()) if slot.cancel.is_cancelled() && !next.is_terminal() => {
                Ok(self.fail(&slot, step, CoreError::Cancelled))
            }
            Ok(()) => Ok(slot.state()),
            Err(err) => Ok(self.fail(&slot, step, err)),
        }
    }

    pub fn status(&self, id: &DocumentId) -> CoreResult<DocumentStatus> {
        let slot = self.slot(id)?;
        let record = slot.record.read();
        Ok(DocumentStatus {
            document_id: record.document.id.clone(),
            state: record.document.state,
            failure: record.document.failure.clone(),
        })
    }

    /// Requests cancellation. If no stage is running the document fails right
    /// away and `Failed` is returned. Otherwise the running stage observes the
    /// flag and fails itself, and the state seen when the request arrived is
    /// returned.
    pub fn cancel(&self, id: &DocumentId) -> CoreResult<LifecycleState> {
        let slot = self.slot(id)?;
        let current = slot.state();
        if current.is_terminal() {
            return Ok(current);
        }
        slot.cancel.cancel();
        let document = slot.document();
        self.record_event(
            AuditEventType::DocumentCancelled,
            &document.id,
            &document.owner_id,
            Actor::User,
            json!({ "requested_in_state": current.to_string() }),
        );

        match Arc::clone(&slot.run_lock).try_lock_owned() {
            Ok(_idle) => {
                let state = slot.state();
                if state.is_terminal() {
                    // A stage that was running settled the document first.
                    return Ok(current);
                }
                let step = next_step(state)
                    .map(|(_, s)| s)
                    .unwrap_or(PipelineStep::Extraction);
                Ok(self.fail(&slot, step, CoreError::Cancelled))
            }
            Err(_) => Ok(current),
        }
    }

    /// The owner's documents, newest first.
    pub fn list_documents(&self, owner: &OwnerId, skip: usize, limit: usize) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .documents
            .iter()
            .map(|e| e.value().document())
            .filter(|d| &d.owner_id == owner)
            .collect();
        docs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        docs.into_iter().skip(skip).take(limit).collect()
    }

    pub fn document_detail(&self, id: &DocumentId) -> CoreResult<DocumentDetail> {
        let slot = self.slot(id)?;
        let record = slot.record.read().clone();
        let disputes = record
            .disputes
            .iter()
            .filter_map(|d| self.disputes.get(d).map(|c| c.clone()))
            .collect();
        Ok(DocumentDetail {
            document: record.document,
            header: record.header,
            transactions: record.transactions,
            insights: record.insights,
            disputes,
        })
    }

    pub fn export_transactions_csv(&self, id: &DocumentId) -> CoreResult<String> {
        let slot = self.slot(id)?;
        let record = slot.record.read();
        render_transactions_csv(&record.transactions)
    }

    /// Applies a user's category choice and remembers it for the owner's
    /// future documents. Baselines already updated are left as they are.
    pub fn recategorize(
        &self,
        id: &DocumentId,
        transaction_id: &TransactionId,
        category: Category,
    ) -> CoreResult<Transaction> {
        let slot = self.slot(id)?;
        let _run = Arc::clone(&slot.run_lock)
            .try_lock_owned()
            .map_err(|_| CoreError::Conflict(format!("document {} is already advancing", id)))?;

        let (updated, owner, previous) = {
            let mut guard = slot.record.write();
            let record = &mut *guard;
            let owner = record.document.owner_id.clone();
            let tx = record
                .transactions
                .iter_mut()
                .find(|t| t.id() == transaction_id)
                .ok_or_else(|| CoreError::NotFound(format!("transaction {}", transaction_id)))?;
            let previous = tx.category().ok_or_else(|| {
                CoreError::InvalidTransition("transaction has not been categorized yet".to_string())
            })?;
            tx.set_category(category, CategorySource::User);
            let updated = tx.clone();
            if record.document.state == LifecycleState::Ready {
                let digest = DocumentDigest::from_transactions(
                    &record.document.id,
                    record.header.as_ref().and_then(|h| h.statement_period),
                    &record.transactions,
                );
                self.history.record(&owner, digest);
            }
            (updated, owner, previous)
        };

        self.categorizer
            .remember(&owner, updated.description(), category);
        self.record_event(
            AuditEventType::TransactionRecategorized,
            id,
            &owner,
            Actor::User,
            json!({
                "transaction_id": transaction_id.as_str(),
                "from_category": previous.as_str(),
                "to_category": category.as_str(),
            }),
        );
        Ok(updated)
    }

    /// Reruns the insight generator on a `Ready` document; the new set replaces the old.
    pub fn regenerate_insights(&self, id: &DocumentId) -> CoreResult<Vec<Insight>> {
        let slot = self.slot(id)?;
        let _run = Arc::clone(&slot.run_lock)
            .try_lock_owned()
            .map_err(|_| CoreError::Conflict(format!("document {} is already advancing", id)))?;
        let mut guard = slot.record.write();
        if guard.document.state != LifecycleState::Ready {
            return Err(CoreError::InvalidTransition(format!(
                "insights can only be regenerated for Ready documents, {} is {}",
                id, guard.document.state
            )));
        }
        self.generate_insights(&mut guard);
        Ok(guard.insights.clone())
    }

    pub fn create_dispute(
        &self,
        id: &DocumentId,
        transaction_id: &TransactionId,
        reason_code: &str,
        detail: &str,
    ) -> CoreResult<DisputeCase> {
        self.compose_dispute(id, transaction_id, reason_code, detail, None)
    }

    /// Writes a new version of an existing dispute. The superseded case is kept.
    pub fn regenerate_dispute(
        &self,
        dispute_id: &DisputeId,
        reason_code: Option<&str>,
        detail: Option<&str>,
    ) -> CoreResult<DisputeCase> {
        let previous = self.dispute(dispute_id)?;
        self.compose_dispute(
            &previous.document_id,
            &previous.transaction_id,
            reason_code.unwrap_or(previous.reason_code.as_str()),
            detail.unwrap_or(&previous.detail),
            Some(&previous),
        )
    }

    pub fn update_dispute_status(&self, dispute_id: &DisputeId, status: DisputeStatus) -> CoreResult<DisputeCase> {
        let (updated, from) = {
            let mut case = self
                .disputes
                .get_mut(dispute_id)
                .ok_or_else(|| CoreError::NotFound(format!("dispute {}", dispute_id)))?;
            let from = case.status;
            case.status = from.transition(status)?;
            (case.clone(), from)
        };
        let owner = self.slot(&updated.document_id)?.document().owner_id;
        self.record_event(
            AuditEventType::DisputeStatusChanged,
            &updated.document_id,
            &owner,
            Actor::User,
            json!({
                "dispute_id": dispute_id.as_str(),
                "from_status": from.as_str(),
                "to_status": status.as_str(),
            }),
        );
        Ok(updated)
    }

    pub fn dispute(&self, dispute_id: &DisputeId) -> CoreResult<DisputeCase> {
        self.disputes
            .get(dispute_id)
            .map(|c| c.clone())
            .ok_or_else(|| CoreError::NotFound(format!("dispute {}", dispute_id)))
    }

    /// Every version of every dispute raised against the document, oldest first.
    pub fn disputes_for_document(&self, id: &DocumentId) -> CoreResult<Vec<DisputeCase>> {
        let slot = self.slot(id)?;
        let ids = slot.record.read().disputes.clone();
        Ok(ids
            .iter()
            .filter_map(|d| self.disputes.get(d).map(|c| c.clone()))
            .collect())
    }

    fn compose_dispute(
        &self,
        id: &DocumentId,
        transaction_id: &TransactionId,
        reason_code: &str,
        detail: &str,
        supersedes: Option<&DisputeCase>,
    ) -> CoreResult<DisputeCase> {
        let slot = self.slot(id)?;
        let (composed, amount, owner) = {
            let record = slot.record.read();
            let tx = record
                .transactions
                .iter()
                .find(|t| t.id() == transaction_id)
                .ok_or_else(|| CoreError::NotFound(format!("transaction {}", transaction_id)))?;
            let facts = LetterFacts {
                document_type: record.document.document_type,
                account_identifier: record
                    .header
                    .as_ref()
                    .and_then(|h| h.account_identifier.as_deref()),
                transaction: tx,
            };
            let composed = self.composer.compose(&facts, reason_code, detail)?;
            (composed, tx.amount(), record.document.owner_id.clone())
        };

        let case = DisputeCase {
            id: DisputeId::new(dispute_id_ulid()),
            document_id: id.clone(),
            transaction_id: transaction_id.clone(),
            reason_code: composed.reason,
            detail: composed.detail,
            letter: composed.body,
            version: supersedes.map(|p| p.version + 1).unwrap_or(1),
            supersedes: supersedes.map(|p| p.id.clone()),
            status: DisputeStatus::Draft,
            created_at: OffsetDateTime::now_utc(),
        };
        self.disputes.insert(case.id.clone(), case.clone());
        slot.record.write().disputes.push(case.id.clone());

        tracing::info!(
            document_id = %id,
            dispute_id = %case.id,
            version = case.version,
            reason = case.reason_code.as_str(),
            "dispute letter generated"
        );
        self.record_event(
            AuditEventType::DisputeGenerated,
            id,
            &owner,
            Actor::User,
            json!({
                "dispute_id": case.id.as_str(),
                "transaction_id": transaction_id.as_str(),
                "reason_code": case.reason_code.as_str(),
                "version": case.version,
                "amount_cents": cents(amount),
                "letter_sha256": sha256_hex(case.letter.as_bytes()),
            }),
        );
        Ok(case)
    }

    fn slot(&self, id: &DocumentId) -> CoreResult<Arc<DocumentSlot>> {
        self.documents
            .get(id)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| CoreError::NotFound(format!("document {}", id)))
    }

    fn set_state(&self, slot: &DocumentSlot, to: LifecycleState, step: PipelineStep) -> CoreResult<()> {
        let (id, owner, from) = {
            let mut record = slot.record.write();
            let from = record.document.state;
            if !valid_transition(from, to) {
                return Err(CoreError::InvalidTransition(format!("{} -> {}", from, to)));
            }
            record.document.state = to;
            (record.document.id.clone(), record.document.owner_id.clone(), from)
        };
        self.state_changed(&id, &owner, from, to, step);
        Ok(())
    }

    fn state_changed(
        &self,
        id: &DocumentId,
        owner: &OwnerId,
        from: LifecycleState,
        to: LifecycleState,
        step: PipelineStep,
    ) {
        tracing::info!(document_id = %id, from = %from, to = %to, step = step.as_str(), "state changed");
        self.record_event(
            AuditEventType::DocumentStateChanged,
            id,
            owner,
            Actor::System,
            json!({
                "from_state": from.to_string(),
                "to_state": to.to_string(),
                "step": step.as_str(),
            }),
        );
    }

    async fn extract(&self, slot: &DocumentSlot) -> CoreResult<()> {
        let request = {
            let record = slot.record.read();
            ExtractionRequest {
                document_id: record.document.id.clone(),
                document_type: record.document.document_type,
                media_type: record.document.metadata.media_type.ok_or_else(|| {
                    CoreError::ExtractionFailure("document has no detected media type".to_string())
                })?,
                content: Arc::clone(&record.content),
            }
        };
        let raw = self.extraction.extract(&request, &slot.cancel).await?;
        slot.record.write().raw = Some(raw);
        Ok(())
    }

    /// Runs a synchronous stage and commits its output together with the new
    /// state, so readers never see one without the other.
    fn run_sync_stage(&self, slot: &DocumentSlot, next: LifecycleState, step: PipelineStep) -> CoreResult<()> {
        let (id, owner, from) = {
            let mut guard = slot.record.write();
            let from = guard.document.state;
            if !valid_transition(from, next) {
                return Err(CoreError::InvalidTransition(format!("{} -> {}", from, next)));
            }
            match step {
                PipelineStep::Normalization => self.normalize(&mut guard)?,
                PipelineStep::Categorization => self.categorize(&mut guard),
                PipelineStep::AnomalyDetection => self.analyze(&mut guard),
                PipelineStep::InsightGeneration => self.generate_insights(&mut guard),
                PipelineStep::Extraction => {
                    return Err(CoreError::InvalidTransition("extraction is asynchronous".to_string()))
                }
            }
            guard.document.state = next;
            (guard.document.id.clone(), guard.document.owner_id.clone(), from)
        };
        self.state_changed(&id, &owner, from, next, step);
        Ok(())
    }

    fn normalize(&self, record: &mut DocumentRecord) -> CoreResult<()> {
        let normalized = {
            let raw = record
                .raw
                .as_ref()
                .ok_or_else(|| CoreError::ExtractionFailure("no extraction output recorded".to_string()))?;
            self.normalizer
                .normalize(&record.document.id, record.document.document_type, raw)
        };
        let report = normalized.report;
        let meta = &mut record.document.metadata;
        meta.line_count = report.total_lines;
        meta.skipped_lines = report.skipped;
        meta.zero_amount_lines = report.zero_amount;
        meta.out_of_period_lines = report.out_of_period;
        meta.line_defects = report.defects;
        tracing::debug!(
            document_id = %record.document.id,
            accepted = report.accepted,
            skipped = report.skipped,
            zero_amount = report.zero_amount,
            "normalized line items"
        );
        record.header = Some(normalized.header);
        record.transactions = normalized.transactions;
        Ok(())
    }

    fn categorize(&self, record: &mut DocumentRecord) {
        let summary = self
            .categorizer
            .categorize_all(&record.document.owner_id, &mut record.transactions);
        tracing::debug!(
            document_id = %record.document.id,
            keyword = summary.keyword,
            precedent = summary.precedent,
            fallback = summary.fallback,
            "categorized transactions"
        );
    }

    fn analyze(&self, record: &mut DocumentRecord) {
        let summary = self.detector.detect(
            &record.document.owner_id,
            &mut record.transactions,
            &self.baselines,
        );
        tracing::debug!(
            document_id = %record.document.id,
            evaluated = summary.evaluated,
            flagged = summary.flagged,
            "anomaly detection finished"
        );
    }

    fn generate_insights(&self, record: &mut DocumentRecord) {
        let owner = record.document.owner_id.clone();
        let period = record.header.as_ref().and_then(|h| h.statement_period);
        let history = self.history.excluding(&owner, &record.document.id);
        let generation = record.insight_generation + 1;
        let insights = self.insights.generate(&InsightInput {
            document_id: &record.document.id,
            transactions: &record.transactions,
            period,
            history: &history,
            total_lines: record.document.metadata.line_count,
            skipped_lines: record.document.metadata.skipped_lines,
            generation,
        });
        record.insights = insights;
        record.insight_generation = generation;
        self.history.record(
            &owner,
            DocumentDigest::from_transactions(&record.document.id, period, &record.transactions),
        );
        self.record_event(
            AuditEventType::InsightsGenerated,
            &record.document.id,
            &owner,
            Actor::System,
            json!({
                "generation": generation,
                "insight_count": record.insights.len(),
            }),
        );
    }

    fn fail(&self, slot: &DocumentSlot, step: PipelineStep, err: CoreError) -> LifecycleState {
        let reason = FailureReason {
            step,
            kind: err.kind(),
            message: err.to_string(),
        };
        let (id, owner, from) = {
            let mut record = slot.record.write();
            let from = record.document.state;
            if from.is_terminal() {
                return from;
            }
            record.document.state = LifecycleState::Failed;
            record.document.failure = Some(reason.clone());
            (record.document.id.clone(), record.document.owner_id.clone(), from)
        };
        tracing::warn!(
            document_id = %id,
            owner_id = %owner,
            step = step.as_str(),
            kind = reason.kind.as_str(),
            "document failed: {}",
            reason.message
        );
        self.state_changed(&id, &owner, from, LifecycleState::Failed, step);
        self.record_event(
            AuditEventType::DocumentFailed,
            &id,
            &owner,
            Actor::System,
            json!({
                "step": step.as_str(),
                "error_kind": reason.kind.as_str(),
                "message": reason.message,
            }),
        );
        LifecycleState::Failed
    }

    /// Audit failures are logged and never interrupt the pipeline.
    fn record_event(
        &self,
        event_type: AuditEventType,
        id: &DocumentId,
        owner: &OwnerId,
        actor: Actor,
        details: serde_json::Value,
    ) {
        let appended = AuditEvent::now(event_type, id, owner, actor, details)
            .and_then(|event| self.audit.lock().append(event));
        if let Err(err) = appended {
            tracing::error!(document_id = %id, event = ?event_type, "audit append failed: {}", err);
        }
    }
}
