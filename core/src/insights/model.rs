use crate::documents::model::{DocumentId, InsightId, TransactionId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    SpendingPattern,
    Anomaly,
    Recommendation,
    Summary,
    System,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::SpendingPattern => "spending_pattern",
            InsightType::Anomaly => "anomaly",
            InsightType::Recommendation => "recommendation",
            InsightType::Summary => "summary",
            InsightType::System => "system",
        }
    }

    /// Lower sorts first among insights of equal importance.
    pub fn precedence(&self) -> u8 {
        match self {
            InsightType::Anomaly => 0,
            InsightType::Recommendation => 1,
            InsightType::SpendingPattern => 2,
            InsightType::Summary => 3,
            InsightType::System => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: InsightId,
    pub document_id: DocumentId,
    /// Which generator run produced this insight; a later run supersedes it.
    pub generation: u32,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub body: String,
    pub importance: u8,
    pub transaction_ids: Vec<TransactionId>,
    /// Earliest date among the referenced transactions.
    pub anchor_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_annual_savings: Option<f64>,
}

/// Importance descending, then type precedence, then earliest referenced date
/// (insights without one last).
pub fn compare_insights(a: &Insight, b: &Insight) -> Ordering {
    b.importance
        .cmp(&a.importance)
        .then(a.insight_type.precedence().cmp(&b.insight_type.precedence()))
        .then(match (a.anchor_date, b.anchor_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

pub fn order_insights(insights: &mut [Insight]) {
    insights.sort_by(compare_insights);
}
