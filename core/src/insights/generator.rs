//! Rule-based insight generation for one document.
//!
//! Each rule family is evaluated on its own and contributes nothing when its
//! trigger does not hold. The combined list is ordered by
//! [`order_insights`](super::model::order_insights) before ids are assigned.

use super::history::DocumentDigest;
use super::model::{order_insights, Insight, InsightType};
use crate::categorize::taxonomy::Category;
use crate::determinism::ids::insight_id;
use crate::documents::model::{DocumentId, InsightId, StatementPeriod, TransactionId};
use crate::error::{CoreError, CoreResult};
use crate::ledger::model::{Direction, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Percentage points a category's share must rise over its historical share.
    pub pattern_delta_pp: f64,
    pub recommendation_min_documents: usize,
    /// How many of the owner's most recent documents (current included) to scan.
    pub recommendation_window: usize,
    /// Fractional amount tolerance for "same approximate amount".
    pub recurring_amount_tolerance: f64,
    pub default_period_days: i64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            pattern_delta_pp: 10.0,
            recommendation_min_documents: 2,
            recommendation_window: 6,
            recurring_amount_tolerance: 0.05,
            default_period_days: 30,
        }
    }
}

impl InsightConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.pattern_delta_pp > 0.0 && self.pattern_delta_pp <= 100.0) {
            return Err(CoreError::Config(format!(
                "insights.pattern_delta_pp must be in (0, 100], got {}",
                self.pattern_delta_pp
            )));
        }
        if self.recommendation_window < 2 {
            return Err(CoreError::Config("insights.recommendation_window must be at least 2".to_string()));
        }
        if self.recommendation_min_documents == 0
            || self.recommendation_min_documents > self.recommendation_window
        {
            return Err(CoreError::Config(
                "insights.recommendation_min_documents must be between 1 and recommendation_window".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.recurring_amount_tolerance) {
            return Err(CoreError::Config("insights.recurring_amount_tolerance must be in [0, 1)".to_string()));
        }
        if self.default_period_days <= 0 {
            return Err(CoreError::Config("insights.default_period_days must be positive".to_string()));
        }
        Ok(())
    }
}

pub struct InsightInput<'a> {
    pub document_id: &'a DocumentId,
    pub transactions: &'a [Transaction],
    pub period: Option<StatementPeriod>,
    /// The owner's other documents, oldest first.
    pub history: &'a [DocumentDigest],
    pub total_lines: usize,
    pub skipped_lines: usize,
    pub generation: u32,
}

struct Draft {
    insight_type: InsightType,
    title: String,
    body: String,
    importance: u8,
    transactions: Vec<(TransactionId, Date)>,
    savings: Option<f64>,
}

impl Draft {
    fn new(insight_type: InsightType, importance: u8, title: String, body: String) -> Self {
        Self {
            insight_type,
            title,
            body,
            importance,
            transactions: Vec::new(),
            savings: None,
        }
    }

    fn referencing<'t>(mut self, txs: impl IntoIterator<Item = &'t Transaction>) -> Self {
        self.transactions = txs.into_iter().map(|t| (t.id().clone(), t.date())).collect();
        self
    }
}

pub struct InsightGenerator {
    config: InsightConfig,
}

impl InsightGenerator {
    pub fn new(config: InsightConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, input: &InsightInput<'_>) -> Vec<Insight> {
        let mut drafts = Vec::new();
        if input.transactions.is_empty() {
            drafts.push(Draft::new(
                InsightType::System,
                3,
                "No transactions found".to_string(),
                "We could not find any transactions in this document. Check that the right file was uploaded, or try a clearer scan.".to_string(),
            ));
        } else {
            drafts.extend(self.anomalies(input));
            drafts.extend(self.recommendations(input));
            drafts.extend(self.spending_patterns(input));
            drafts.push(self.summary(input));
        }
        if input.skipped_lines > 0 {
            drafts.push(Draft::new(
                InsightType::System,
                2,
                "Some lines could not be read".to_string(),
                format!(
                    "{} of {} lines in this document could not be read and were left out of the analysis.",
                    input.skipped_lines, input.total_lines
                ),
            ));
        }

        let mut insights: Vec<Insight> = drafts
            .into_iter()
            .map(|d| {
                let anchor_date = d.transactions.iter().map(|(_, date)| *date).min();
                Insight {
                    id: InsightId::new(String::new()),
                    document_id: input.document_id.clone(),
                    generation: input.generation,
                    insight_type: d.insight_type,
                    title: d.title,
                    body: d.body,
                    importance: d.importance,
                    transaction_ids: d.transactions.into_iter().map(|(id, _)| id).collect(),
                    anchor_date,
                    estimated_annual_savings: d.savings,
                }
            })
            .collect();
        order_insights(&mut insights);
        for (ordinal, insight) in insights.iter_mut().enumerate() {
            insight.id = InsightId::new(insight_id(input.document_id.as_str(), input.generation, ordinal));
        }
        insights
    }

    fn anomalies(&self, input: &InsightInput<'_>) -> Vec<Draft> {
        input
            .transactions
            .iter()
            .filter(|t| t.is_flagged())
            .map(|t| {
                let importance = match t.flag_severity() {
                    Some(crate::anomaly::detector::FlagSeverity::Severe) => 5,
                    _ => 4,
                };
                let category = t.category().unwrap_or(Category::Other);
                Draft::new(
                    InsightType::Anomaly,
                    importance,
                    format!("Unusual {} charge: {}", category, t.description()),
                    format!(
                        "{} If you don't recognise this charge you can open a dispute for it.",
                        t.flag_reason().unwrap_or("This charge is out of line with your usual spending.")
                    ),
                )
                .referencing([t])
            })
            .collect()
    }

    fn recommendations(&self, input: &InsightInput<'_>) -> Vec<Draft> {
        let tol = self.config.recurring_amount_tolerance;
        let keep = self.config.recommendation_window.saturating_sub(1);
        let window = &input.history[input.history.len().saturating_sub(keep)..];

        let mut groups: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
        for t in input.transactions {
            if !t.normalized_description().is_empty() {
                groups.entry(t.normalized_description()).or_default().push(t);
            }
        }

        let mut out = Vec::new();
        for (key, txs) in groups {
            let debits: Vec<&Transaction> = txs.iter().copied().filter(|t| t.is_debit()).collect();
            let Some(first) = debits.first() else {
                continue;
            };
            let amount = first.amount();
            // A refund or a varying charge means the merchant is actually used.
            let usage_here = debits.len() != txs.len()
                || debits.iter().any(|t| !same_amount(t.amount(), amount, tol));
            if usage_here {
                continue;
            }

            let mut documents = 1;
            let mut usage = false;
            for digest in window {
                let mut matched = false;
                for line in digest.lines.iter().filter(|l| l.key == key) {
                    if line.direction == Direction::Debit && same_amount(line.amount, amount, tol) {
                        matched = true;
                    } else {
                        usage = true;
                    }
                }
                if matched {
                    documents += 1;
                }
            }
            if usage || documents < self.config.recommendation_min_documents {
                continue;
            }

            let period_days = input
                .period
                .map(|p| p.days())
                .unwrap_or(self.config.default_period_days)
                .max(1);
            let periods_per_year = (365.25 / period_days as f64).round().max(1.0);
            let per_year = debits.len() as f64 * periods_per_year;
            let annual = round_cents(amount * per_year);
            let window_size = window.len() + 1;

            let mut draft = Draft::new(
                InsightType::Recommendation,
                3,
                format!("Review recurring charge: {}", first.description()),
                format!(
                    "{} charged ${:.2} in {} of your last {} statements with no other activity from this merchant. If you no longer use it, cancelling would save about ${:.2} per year.",
                    first.description(),
                    amount,
                    documents,
                    window_size,
                    annual
                ),
            )
            .referencing(debits.iter().copied());
            draft.savings = Some(annual);
            out.push(draft);
        }
        out
    }

    fn spending_patterns(&self, input: &InsightInput<'_>) -> Vec<Draft> {
        let current = debit_totals(input.transactions);
        let current_total: f64 = current.values().sum();
        let mut historical: BTreeMap<Category, f64> = BTreeMap::new();
        for digest in input.history {
            for (c, v) in &digest.category_debits {
                *historical.entry(*c).or_insert(0.0) += v;
            }
        }
        let historical_total: f64 = historical.values().sum();
        if current_total <= 0.0 || historical_total <= 0.0 {
            return Vec::new();
        }

        let threshold = self.config.pattern_delta_pp;
        let mut out = Vec::new();
        for (category, amount) in &current {
            let share = amount / current_total * 100.0;
            let past = historical.get(category).copied().unwrap_or(0.0) / historical_total * 100.0;
            let delta = share - past;
            if delta < threshold {
                continue;
            }
            let steps = ((delta - threshold) / 10.0).floor() as u8;
            let importance = 3u8.saturating_add(steps).min(5);
            out.push(
                Draft::new(
                    InsightType::SpendingPattern,
                    importance,
                    format!("{} spending is up", category),
                    format!(
                        "{} made up {:.1}% of your spending this period (${:.2}), compared with {:.1}% in your earlier statements, an increase of {:.1} percentage points.",
                        category, share, amount, past, delta
                    ),
                )
                .referencing(
                    input
                        .transactions
                        .iter()
                        .filter(|t| t.is_debit() && t.category().unwrap_or(Category::Other) == *category),
                ),
            );
        }
        out
    }

    fn summary(&self, input: &InsightInput<'_>) -> Draft {
        let debits: f64 = input.transactions.iter().filter(|t| t.is_debit()).map(|t| t.amount()).sum();
        let credits: f64 = input.transactions.iter().filter(|t| !t.is_debit()).map(|t| t.amount()).sum();
        let totals = debit_totals(input.transactions);
        let top = totals
            .iter()
            .fold(None::<(Category, f64)>, |best, (c, v)| match best {
                Some((_, b)) if b >= *v => best,
                _ => Some((*c, *v)),
            });
        let mut body = format!(
            "{} transactions: ${:.2} spent and ${:.2} received.",
            input.transactions.len(),
            debits,
            credits
        );
        if let Some((category, amount)) = top {
            body.push_str(&format!(" Largest spending category: {} (${:.2}).", category, amount));
        }
        Draft::new(InsightType::Summary, 2, "Statement summary".to_string(), body)
    }
}

fn debit_totals(transactions: &[Transaction]) -> BTreeMap<Category, f64> {
    let mut totals = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.is_debit()) {
        *totals.entry(t.category().unwrap_or(Category::Other)).or_insert(0.0) += t.amount();
    }
    totals
}

fn same_amount(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs()) + 0.005
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
