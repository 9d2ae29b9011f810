//! Pipeline configuration: serde defaults, TOML loading, builder overrides.

use crate::anomaly::detector::AnomalyConfig;
use crate::categorize::categorizer::CategorizerConfig;
use crate::disputes::composer::DisputeConfig;
use crate::error::{CoreError, CoreResult};
use crate::insights::generator::InsightConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extraction_timeout_ms: u64,
    pub worker_pool_size: usize,
    pub max_upload_bytes: u64,
    pub audit_log_path: Option<PathBuf>,
    pub anomaly: AnomalyConfig,
    pub insights: InsightConfig,
    pub categorizer: CategorizerConfig,
    pub disputes: DisputeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_ms: 30_000,
            worker_pool_size: 4,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            audit_log_path: None,
            anomaly: AnomalyConfig::default(),
            insights: InsightConfig::default(),
            categorizer: CategorizerConfig::default(),
            disputes: DisputeConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        let config: PipelineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.extraction_timeout_ms == 0 {
            return Err(CoreError::Config("extraction_timeout_ms must be positive".to_string()));
        }
        if self.worker_pool_size == 0 {
            return Err(CoreError::Config("worker_pool_size must be at least 1".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(CoreError::Config("max_upload_bytes must be positive".to_string()));
        }
        self.anomaly.validate()?;
        self.insights.validate()?;
        self.disputes.validate()?;
        self.categorizer
            .keyword_table()
            .map_err(|e| CoreError::Config(format!("categorizer.extra_keywords: {}", e)))?;
        Ok(())
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_millis(self.extraction_timeout_ms)
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size;
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn with_audit_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit_log_path = Some(path.into());
        self
    }

    pub fn with_anomaly(mut self, anomaly: AnomalyConfig) -> Self {
        self.anomaly = anomaly;
        self
    }

    pub fn with_insights(mut self, insights: InsightConfig) -> Self {
        self.insights = insights;
        self
    }

    pub fn with_categorizer(mut self, categorizer: CategorizerConfig) -> Self {
        self.categorizer = categorizer;
        self
    }

    pub fn with_disputes(mut self, disputes: DisputeConfig) -> Self {
        self.disputes = disputes;
        self
    }
}
