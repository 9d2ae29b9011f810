use crate::error::{CoreError, CoreResult};
use crate::extraction::interface::{ExtractionAdapter, ExtractionRequest, RawExtraction};
use crate::pipeline::cancel::CancelSignal;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wraps the adapter call with a bounded wait and cooperative cancellation.
#[derive(Clone)]
pub struct ExtractionRuntime {
    adapter: Arc<dyn ExtractionAdapter>,
    timeout: Duration,
}

impl ExtractionRuntime {
    pub fn new(adapter: Arc<dyn ExtractionAdapter>, timeout: Duration) -> Self {
        Self { adapter, timeout }
    }

    pub fn adapter_id(&self) -> &str {
        self.adapter.adapter_id()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn extract(
        &self,
        request: &ExtractionRequest,
        cancel: &CancelSignal,
    ) -> CoreResult<RawExtraction> {
        let started = Instant::now();
        let call = tokio::time::timeout(self.timeout, self.adapter.extract(request));
        let outcome = tokio::select! {
            res = call => res,
            _ = cancel.cancelled() => return Err(CoreError::Cancelled),
        };
        match outcome {
            Err(_) => {
                tracing::warn!(
                    document_id = %request.document_id,
                    adapter = self.adapter.adapter_id(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "extraction adapter timed out"
                );
                Err(CoreError::ExtractionTimeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
            Ok(Err(adapter_err)) => {
                tracing::warn!(
                    document_id = %request.document_id,
                    code = %adapter_err.code,
                    "extraction adapter failed"
                );
                Err(CoreError::ExtractionFailure(adapter_err.to_string()))
            }
            Ok(Ok(raw)) => {
                tracing::debug!(
                    document_id = %request.document_id,
                    lines = raw.line_items.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "extraction completed"
                );
                Ok(raw)
            }
        }
    }
}
