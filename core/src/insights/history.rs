use crate::categorize::taxonomy::Category;
use crate::documents::model::{DocumentId, OwnerId, StatementPeriod};
use crate::ledger::model::{Direction, Transaction};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestLine {
    pub key: String,
    pub amount: f64,
    pub direction: Direction,
}

/// What later documents need to know about a finished one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDigest {
    pub document_id: DocumentId,
    pub period: Option<StatementPeriod>,
    pub category_debits: BTreeMap<Category, f64>,
    pub lines: Vec<DigestLine>,
}

impl DocumentDigest {
    pub fn from_transactions(
        document_id: &DocumentId,
        period: Option<StatementPeriod>,
        transactions: &[Transaction],
    ) -> Self {
        let mut category_debits = BTreeMap::new();
        let mut lines = Vec::with_capacity(transactions.len());
        for t in transactions {
            if t.is_debit() {
                *category_debits
                    .entry(t.category().unwrap_or(Category::Other))
                    .or_insert(0.0) += t.amount();
            }
            lines.push(DigestLine {
                key: t.normalized_description().to_string(),
                amount: t.amount(),
                direction: t.direction(),
            });
        }
        Self {
            document_id: document_id.clone(),
            period,
            category_debits,
            lines,
        }
    }

    pub fn total_debits(&self) -> f64 {
        self.category_debits.values().sum()
    }
}

/// Per-owner digests in completion order.
#[derive(Debug, Default)]
pub struct OwnerHistory {
    digests: DashMap<OwnerId, Vec<DocumentDigest>>,
}

impl OwnerHistory {
    /// Appends, or replaces the digest of a document seen before.
    pub fn record(&self, owner: &OwnerId, digest: DocumentDigest) {
        let mut entry = self.digests.entry(owner.clone()).or_default();
        match entry
            .iter_mut()
            .find(|d| d.document_id == digest.document_id)
        {
            Some(existing) => *existing = digest,
            None => entry.push(digest),
        }
    }

    /// Digests of the owner's other documents, oldest first.
    pub fn excluding(&self, owner: &OwnerId, document_id: &DocumentId) -> Vec<DocumentDigest> {
        self.digests
            .get(owner)
            .map(|list| {
                list.iter()
                    .filter(|d| &d.document_id != document_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self, owner: &OwnerId) -> usize {
        self.digests.get(owner).map(|l| l.len()).unwrap_or(0)
    }
}
