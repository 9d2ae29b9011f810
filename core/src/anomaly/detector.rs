use super::baseline::{BaselineStore, CategoryBaseline};
use crate::categorize::taxonomy::Category;
use crate::documents::model::OwnerId;
use crate::error::{CoreError, CoreResult};
use crate::ledger::model::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Built-in cold-start limits. `Other` is left to the fallback.
const DEFAULT_COLD_START: [(Category, f64); 14] = [
    (Category::Housing, 3000.0),
    (Category::Transportation, 300.0),
    (Category::Food, 200.0),
    (Category::Utilities, 400.0),
    (Category::Insurance, 600.0),
    (Category::Healthcare, 500.0),
    (Category::DebtPayments, 2000.0),
    (Category::Savings, 5000.0),
    (Category::PersonalSpending, 300.0),
    (Category::Entertainment, 150.0),
    (Category::Education, 2000.0),
    (Category::GiftsAndDonations, 300.0),
    (Category::Travel, 1000.0),
    (Category::Business, 1000.0),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Standard deviations above the mean before a debit is flagged.
    pub k: f64,
    /// Below this many samples the cold-start threshold also applies.
    pub min_samples: u64,
    /// Minimum samples before the statistical rule is trusted at all.
    pub min_statistical_samples: u64,
    /// Overrides of the built-in cold-start limits, keyed by category display
    /// name or snake_case name.
    pub cold_start_thresholds: BTreeMap<String, f64>,
    pub fallback_cold_start_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            k: 2.0,
            min_samples: 5,
            min_statistical_samples: 2,
            cold_start_thresholds: BTreeMap::new(),
            fallback_cold_start_threshold: 500.0,
        }
    }
}

impl AnomalyConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.k.is_finite() && self.k > 0.0) {
            return Err(CoreError::Config(format!("anomaly.k must be positive, got {}", self.k)));
        }
        if self.min_statistical_samples == 0 {
            return Err(CoreError::Config("anomaly.min_statistical_samples must be at least 1".to_string()));
        }
        if self.min_statistical_samples > self.min_samples {
            return Err(CoreError::Config(
                "anomaly.min_statistical_samples cannot exceed anomaly.min_samples".to_string(),
            ));
        }
        self.resolved_cold_start_thresholds()?;
        if !(self.fallback_cold_start_threshold.is_finite() && self.fallback_cold_start_threshold >= 0.0) {
            return Err(CoreError::Config("fallback_cold_start_threshold must be >= 0".to_string()));
        }
        Ok(())
    }

    /// Built-in limits with the configured overrides applied on top.
    pub fn resolved_cold_start_thresholds(&self) -> CoreResult<BTreeMap<Category, f64>> {
        let mut resolved: BTreeMap<Category, f64> = DEFAULT_COLD_START.into_iter().collect();
        for (name, v) in &self.cold_start_thresholds {
            let category = name
                .parse::<Category>()
                .map_err(|_| CoreError::Config(format!("unknown category in cold_start_thresholds: {}", name)))?;
            if !(v.is_finite() && *v >= 0.0) {
                return Err(CoreError::Config(format!("cold-start threshold for {} must be >= 0", name)));
            }
            resolved.insert(category, *v);
        }
        Ok(resolved)
    }

    pub fn cold_start_threshold(&self, category: Category) -> f64 {
        self.cold_start_thresholds
            .iter()
            .find(|(name, _)| name.parse::<Category>().ok() == Some(category))
            .map(|(_, v)| *v)
            .or_else(|| {
                DEFAULT_COLD_START
                    .iter()
                    .find(|(c, _)| *c == category)
                    .map(|(_, v)| *v)
            })
            .unwrap_or(self.fallback_cold_start_threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSeverity {
    Elevated,
    /// More than three standard deviations out.
    Severe,
}

impl FlagSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagSeverity::Elevated => "elevated",
            FlagSeverity::Severe => "severe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagRule {
    Statistical,
    ColdStart,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub rule: FlagRule,
    pub severity: FlagSeverity,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetectionSummary {
    pub evaluated: usize,
    pub flagged: usize,
}

pub struct AnomalyDetector {
    config: AnomalyConfig,
    cold_start: BTreeMap<Category, f64>,
}

impl AnomalyDetector {
    /// Unresolvable overrides are skipped here; `validate` reports them.
    pub fn new(config: AnomalyConfig) -> Self {
        let cold_start = config.resolved_cold_start_thresholds().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring cold-start overrides");
            DEFAULT_COLD_START.into_iter().collect()
        });
        Self { config, cold_start }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Pure decision for one debit against a baseline snapshot.
    pub fn judge(&self, category: Category, amount: f64, baseline: &CategoryBaseline) -> Option<Verdict> {
        let sd = baseline.stddev();
        let sigmas = if sd > 0.0 {
            Some((amount - baseline.mean) / sd)
        } else {
            None
        };

        if baseline.count >= self.config.min_statistical_samples {
            let threshold = baseline.mean + self.config.k * sd;
            if amount > threshold {
                let reason = match sigmas {
                    Some(s) => format!(
                        "${:.2} is {:.1} standard deviations above your usual {} spending (average ${:.2} over {} transactions).",
                        amount, s, category, baseline.mean, baseline.count
                    ),
                    None => format!(
                        "${:.2} is above your usual {} spending, which has been a steady ${:.2} across {} transactions.",
                        amount, category, baseline.mean, baseline.count
                    ),
                };
                return Some(Verdict {
                    rule: FlagRule::Statistical,
                    severity: severity_for(sigmas),
                    reason,
                });
            }
        }

        let limit = self
            .cold_start
            .get(&category)
            .copied()
            .unwrap_or(self.config.fallback_cold_start_threshold);
        if baseline.count < self.config.min_samples && amount > limit {
            let over = amount - limit;
            return Some(Verdict {
                rule: FlagRule::ColdStart,
                severity: match sigmas {
                    Some(s) if s > 3.0 => FlagSeverity::Severe,
                    _ => FlagSeverity::Elevated,
                },
                reason: format!(
                    "${:.2} is ${:.2} over the ${:.2} review limit for {} while only {} earlier transactions are on record.",
                    amount, over, limit, category, baseline.count
                ),
            });
        }
        None
    }

    /// Flags debits in date order, folding each into the owner's baseline
    /// after it has been judged.
    pub fn detect(
        &self,
        owner: &OwnerId,
        transactions: &mut [Transaction],
        store: &BaselineStore,
    ) -> DetectionSummary {
        let mut order: Vec<usize> = (0..transactions.len()).collect();
        order.sort_by_key(|&i| (transactions[i].date(), transactions[i].line_index()));

        let mut summary = DetectionSummary::default();
        for i in order {
            let tx = &mut transactions[i];
            let Some(category) = tx.category() else {
                continue;
            };
            if !tx.is_debit() {
                continue;
            }
            let amount = tx.amount();
            let (verdict, _) = store.observe_with(owner, category, amount, |before| {
                self.judge(category, amount, before)
            });
            summary.evaluated += 1;
            if let Some(v) = verdict {
                tracing::debug!(
                    owner_id = %owner,
                    transaction_id = %tx.id(),
                    category = category.as_str(),
                    rule = ?v.rule,
                    "transaction flagged"
                );
                tx.flag(v.reason, v.severity);
                summary.flagged += 1;
            }
        }
        summary
    }
}

fn severity_for(sigmas: Option<f64>) -> FlagSeverity {
    match sigmas {
        Some(s) if s <= 3.0 => FlagSeverity::Elevated,
        _ => FlagSeverity::Severe,
    }
}
