use crate::anomaly::detector::FlagSeverity;
use crate::categorize::categorizer::CategorySource;
use crate::categorize::taxonomy::Category;
use crate::documents::model::{DocumentId, ExtractedHeader, LineDefect, TransactionId};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Debit => "debit",
            Direction::Credit => "credit",
        }
    }
}

/// One normalized line item. Fields are fixed once normalized; only the
/// category and anomaly flag are filled in by later pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    document_id: DocumentId,
    line_index: usize,
    date: Date,
    amount: f64,
    direction: Direction,
    description: String,
    normalized_description: String,
    out_of_period: bool,
    category: Option<Category>,
    category_source: Option<CategorySource>,
    flagged: bool,
    flag_reason: Option<String>,
    flag_severity: Option<FlagSeverity>,
}

impl Transaction {
    pub fn new(
        document_id: &DocumentId,
        line_index: usize,
        date: Date,
        amount: f64,
        direction: Direction,
        description: &str,
    ) -> CoreResult<Self> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "transaction amount must be positive, got {}",
                amount
            )));
        }
        let description = description.trim().to_string();
        let normalized_description = super::normalizer::normalize_description(&description);
        let id = TransactionId::new(crate::determinism::ids::transaction_id(
            document_id.as_str(),
            line_index,
            &date.to_string(),
            amount,
            &description,
        ));
        Ok(Self {
            id,
            document_id: document_id.clone(),
            line_index,
            date,
            amount,
            direction,
            description,
            normalized_description,
            out_of_period: false,
            category: None,
            category_source: None,
            flagged: false,
            flag_reason: None,
            flag_severity: None,
        })
    }

    pub fn with_category(mut self, category: Category, source: CategorySource) -> Self {
        self.set_category(category, source);
        self
    }

    pub fn with_anomaly(mut self, reason: String, severity: FlagSeverity) -> Self {
        self.flag(reason, severity);
        self
    }

    pub(crate) fn set_category(&mut self, category: Category, source: CategorySource) {
        self.category = Some(category);
        self.category_source = Some(source);
    }

    pub(crate) fn flag(&mut self, reason: String, severity: FlagSeverity) {
        self.flagged = true;
        self.flag_reason = Some(reason);
        self.flag_severity = Some(severity);
    }

    pub(crate) fn mark_out_of_period(&mut self) {
        self.out_of_period = true;
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn date(&self) -> Date {
        self.date
    }

    /// Always positive; see [`Transaction::direction`].
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_debit(&self) -> bool {
        self.direction == Direction::Debit
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn normalized_description(&self) -> &str {
        &self.normalized_description
    }

    pub fn out_of_period(&self) -> bool {
        self.out_of_period
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn category_source(&self) -> Option<CategorySource> {
        self.category_source
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub fn flag_reason(&self) -> Option<&str> {
        self.flag_reason.as_deref()
    }

    pub fn flag_severity(&self) -> Option<FlagSeverity> {
        self.flag_severity
    }
}

/// Counters describing what normalization kept and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub total_lines: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub zero_amount: usize,
    pub out_of_period: usize,
    pub defects: Vec<LineDefect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    pub header: ExtractedHeader,
    pub transactions: Vec<Transaction>,
    pub report: NormalizationReport,
}
