use crate::documents::media::MediaType;
use crate::documents::model::{DocumentId, DocumentType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Header fields exactly as the parsing capability read them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawHeader {
    pub account_identifier: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub opening_balance: Option<String>,
    pub closing_balance: Option<String>,
    pub total_debits: Option<String>,
    pub total_credits: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLineItem {
    pub date: String,
    pub amount: String,
    pub description: String,
}

impl RawLineItem {
    pub fn new(date: &str, amount: &str, description: &str) -> Self {
        Self {
            date: date.to_string(),
            amount: amount.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExtraction {
    #[serde(default)]
    pub header: RawHeader,
    #[serde(default)]
    pub line_items: Vec<RawLineItem>,
}

#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub document_id: DocumentId,
    pub document_type: DocumentType,
    pub media_type: MediaType,
    pub content: Arc<[u8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterErrorCategory {
    Timeout,
    Unsupported,
    Malformed,
    Runtime,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct AdapterError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    pub category: AdapterErrorCategory,
}

/// Contract for the external OCR / parsing capability.
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    fn adapter_id(&self) -> &str;
    async fn extract(&self, request: &ExtractionRequest) -> Result<RawExtraction, AdapterError>;
}

pub fn classify_adapter_error(err: &str) -> AdapterError {
    let lowered = err.to_ascii_lowercase();
    let (category, code, retryable) = if lowered.contains("timeout") || lowered.contains("timed out") {
        (AdapterErrorCategory::Timeout, "ADAPTER_TIMEOUT", true)
    } else if lowered.contains("unsupported") {
        (AdapterErrorCategory::Unsupported, "NOT_SUPPORTED", false)
    } else if lowered.contains("malformed") || lowered.contains("corrupt") || lowered.contains("unreadable") {
        (AdapterErrorCategory::Malformed, "MALFORMED_DOCUMENT", false)
    } else {
        (AdapterErrorCategory::Runtime, "RUNTIME_ERROR", false)
    };
    AdapterError {
        code: code.to_string(),
        message: err.to_string(),
        retryable,
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_free_text_errors() {
        assert_eq!(
            classify_adapter_error("upstream timed out").category,
            AdapterErrorCategory::Timeout
        );
        assert!(classify_adapter_error("request timeout").retryable);
        assert_eq!(
            classify_adapter_error("corrupt xref table").code,
            "MALFORMED_DOCUMENT"
        );
        assert_eq!(
            classify_adapter_error("boom").category,
            AdapterErrorCategory::Runtime
        );
    }

    #[test]
    fn raw_extraction_tolerates_missing_sections() {
        let raw: RawExtraction =
            serde_json::from_str(r#"{"line_items":[{"date":"2026-01-02","amount":"-4.50","description":"COFFEE"}]}"#)
                .unwrap();
        assert_eq!(raw.header, RawHeader::default());
        assert_eq!(raw.line_items.len(), 1);
    }
}
