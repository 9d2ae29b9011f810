use crate::error::{CoreError, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::{Date, OffsetDateTime};

use super::media::MediaType;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(DocumentId);
string_id!(OwnerId);
string_id!(TransactionId);
string_id!(DisputeId);
string_id!(InsightId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    BankStatement,
    CreditCardStatement,
    UtilityBill,
    Invoice,
    Receipt,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 6] = [
        DocumentType::BankStatement,
        DocumentType::CreditCardStatement,
        DocumentType::UtilityBill,
        DocumentType::Invoice,
        DocumentType::Receipt,
        DocumentType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::BankStatement => "bank_statement",
            DocumentType::CreditCardStatement => "credit_card_statement",
            DocumentType::UtilityBill => "utility_bill",
            DocumentType::Invoice => "invoice",
            DocumentType::Receipt => "receipt",
            DocumentType::Other => "other",
        }
    }

    /// Charge-style documents list money owed as positive amounts; statement-style
    /// documents list outflows as negative amounts.
    pub fn positive_is_debit(&self) -> bool {
        matches!(
            self,
            DocumentType::CreditCardStatement
                | DocumentType::UtilityBill
                | DocumentType::Invoice
                | DocumentType::Receipt
        )
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| CoreError::InvalidInput(format!("unsupported document type: {}", wanted)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    Uploaded,
    Extracting,
    Extracted,
    Categorizing,
    Analyzing,
    Ready,
    Failed,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Ready | LifecycleState::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Extraction,
    Normalization,
    Categorization,
    AnomalyDetection,
    InsightGeneration,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Extraction => "extraction",
            PipelineStep::Normalization => "normalization",
            PipelineStep::Categorization => "categorization",
            PipelineStep::AnomalyDetection => "anomaly_detection",
            PipelineStep::InsightGeneration => "insight_generation",
        }
    }
}

/// Why a run stopped. Partial results written before the failure stay visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub step: PipelineStep,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed at {}: {}", self.kind, self.step.as_str(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDefect {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: Option<String>,
    pub description: Option<String>,
    pub media_type: Option<MediaType>,
    pub size_bytes: u64,
    pub sha256: String,
    pub line_count: usize,
    pub skipped_lines: usize,
    pub zero_amount_lines: usize,
    pub out_of_period_lines: usize,
    pub line_defects: Vec<LineDefect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub owner_id: OwnerId,
    pub document_type: DocumentType,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    pub state: LifecycleState,
    pub failure: Option<FailureReason>,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start: Date,
    pub end: Date,
}

impl StatementPeriod {
    pub fn contains(&self, date: Date) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).whole_days() + 1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedHeader {
    pub account_identifier: Option<String>,
    pub statement_period: Option<StatementPeriod>,
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
    pub total_debits: Option<f64>,
    pub total_credits: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn document_type_parses_closed_set_only() {
        assert_eq!(
            "credit_card_statement".parse::<DocumentType>().unwrap(),
            DocumentType::CreditCardStatement
        );
        assert!(matches!(
            "unknown_type".parse::<DocumentType>(),
            Err(CoreError::InvalidInput(_))
        ));
        assert!("Bank_Statement".parse::<DocumentType>().is_err());
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let p = StatementPeriod {
            start: date!(2026 - 01 - 01),
            end: date!(2026 - 01 - 31),
        };
        assert!(p.contains(date!(2026 - 01 - 31)));
        assert!(!p.contains(date!(2026 - 02 - 01)));
        assert_eq!(p.days(), 31);
    }

    #[test]
    fn failure_reason_reads_naturally() {
        let r = FailureReason {
            step: PipelineStep::Extraction,
            kind: ErrorKind::ExtractionTimeout,
            message: "adapter exceeded 50ms".to_string(),
        };
        assert_eq!(
            r.to_string(),
            "ExtractionTimeout failed at extraction: adapter exceeded 50ms"
        );
    }
}
