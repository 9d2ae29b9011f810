use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unparseable line {line}: {reason}")]
    UnparseableLine { line: usize, reason: String },

    #[error("extraction timed out after {timeout_ms}ms")]
    ExtractionTimeout { timeout_ms: u64 },

    #[error("extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("cancelled")]
    Cancelled,

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("determinism violation: {0}")]
    DeterminismViolation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Stable classification of a [`CoreError`], safe to persist and show to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    UnparseableLine,
    ExtractionTimeout,
    ExtractionFailure,
    Cancelled,
    InvalidTransition,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::UnparseableLine => "UnparseableLine",
            ErrorKind::ExtractionTimeout => "ExtractionTimeout",
            ErrorKind::ExtractionFailure => "ExtractionFailure",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::InvalidTransition => "InvalidTransition",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidInput(_) | CoreError::Config(_) => ErrorKind::InvalidInput,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::UnparseableLine { .. } => ErrorKind::UnparseableLine,
            CoreError::ExtractionTimeout { .. } => ErrorKind::ExtractionTimeout,
            CoreError::ExtractionFailure(_) => ErrorKind::ExtractionFailure,
            CoreError::Cancelled => ErrorKind::Cancelled,
            CoreError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            CoreError::DeterminismViolation(_)
            | CoreError::Io(_)
            | CoreError::Json(_)
            | CoreError::Csv(_)
            | CoreError::Toml(_) => ErrorKind::Internal,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
