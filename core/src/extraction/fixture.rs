use crate::determinism::ids::sha256_hex;
use crate::extraction::interface::{
    classify_adapter_error, AdapterError, AdapterErrorCategory, ExtractionAdapter,
    ExtractionRequest, RawExtraction,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
enum FixtureOutcome {
    Extraction(RawExtraction),
    Failure(String),
}

/// In-process adapter that answers from pre-registered results keyed by the
/// SHA-256 of the document bytes.
#[derive(Debug)]
pub struct FixtureAdapter {
    id: String,
    fixtures: DashMap<String, FixtureOutcome>,
    latency: Option<Duration>,
}

impl FixtureAdapter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fixtures: DashMap::new(),
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn register(&self, content: &[u8], extraction: RawExtraction) {
        self.fixtures
            .insert(sha256_hex(content), FixtureOutcome::Extraction(extraction));
    }

    pub fn register_failure(&self, content: &[u8], message: impl Into<String>) {
        self.fixtures
            .insert(sha256_hex(content), FixtureOutcome::Failure(message.into()));
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

#[async_trait]
impl ExtractionAdapter for FixtureAdapter {
    fn adapter_id(&self) -> &str {
        &self.id
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<RawExtraction, AdapterError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let key = sha256_hex(&request.content);
        // Clone out of the map before returning so no shard guard is held.
        let outcome = self.fixtures.get(&key).map(|e| e.value().clone());
        match outcome {
            Some(FixtureOutcome::Extraction(raw)) => Ok(raw),
            Some(FixtureOutcome::Failure(message)) => Err(classify_adapter_error(&message)),
            None => Err(AdapterError {
                code: "UNKNOWN_CONTENT".to_string(),
                message: format!("no extraction registered for content {}", &key[..12]),
                retryable: false,
                category: AdapterErrorCategory::Unsupported,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::media::MediaType;
    use crate::documents::model::{DocumentId, DocumentType};
    use crate::extraction::interface::RawLineItem;
    use std::sync::Arc;

    fn request(bytes: &[u8]) -> ExtractionRequest {
        ExtractionRequest {
            document_id: DocumentId::from("doc_test"),
            document_type: DocumentType::BankStatement,
            media_type: MediaType::Pdf,
            content: Arc::from(bytes),
        }
    }

    #[tokio::test]
    async fn answers_registered_content() {
        let adapter = FixtureAdapter::new("fixture");
        let raw = RawExtraction {
            line_items: vec![RawLineItem::new("2026-01-02", "-3.00", "TEA")],
            ..Default::default()
        };
        adapter.register(b"%PDF-1.4 a", raw.clone());
        assert_eq!(adapter.extract(&request(b"%PDF-1.4 a")).await.unwrap(), raw);
    }

    #[tokio::test]
    async fn unknown_and_failing_content_error() {
        let adapter = FixtureAdapter::new("fixture");
        adapter.register_failure(b"%PDF-1.4 bad", "corrupt xref table");
        let err = adapter.extract(&request(b"%PDF-1.4 bad")).await.unwrap_err();
        assert_eq!(err.category, AdapterErrorCategory::Malformed);
        let err = adapter.extract(&request(b"%PDF-1.4 other")).await.unwrap_err();
        assert_eq!(err.code, "UNKNOWN_CONTENT");
    }
}
