use super::taxonomy::{Category, KeywordTable};
use crate::documents::model::OwnerId;
use crate::error::CoreResult;
use crate::ledger::model::Transaction;
use crate::ledger::normalizer::normalize_description;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizerConfig {
    /// Category name -> extra keywords appended to the built-in table.
    pub extra_keywords: BTreeMap<String, Vec<String>>,
}

impl CategorizerConfig {
    pub fn keyword_table(&self) -> CoreResult<KeywordTable> {
        let mut table = KeywordTable::default();
        for (name, keywords) in &self.extra_keywords {
            let category: Category = name.parse()?;
            table.extend(category, keywords);
        }
        Ok(table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    Keyword,
    Precedent,
    Fallback,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categorization {
    pub category: Category,
    pub source: CategorySource,
    pub matched_keyword: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategorizationSummary {
    pub keyword: usize,
    pub precedent: usize,
    pub fallback: usize,
}

/// Owner-scoped memory of explicit category choices, keyed by normalized description.
#[derive(Debug, Default)]
pub struct PrecedentMemory {
    choices: DashMap<(OwnerId, String), Category>,
}

impl PrecedentMemory {
    pub fn recall(&self, owner: &OwnerId, normalized: &str) -> Option<Category> {
        self.choices
            .get(&(owner.clone(), normalized.to_string()))
            .map(|c| *c)
    }

    pub fn remember(&self, owner: &OwnerId, normalized: &str, category: Category) {
        if normalized.is_empty() {
            return;
        }
        self.choices
            .insert((owner.clone(), normalized.to_string()), category);
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

/// Keyword table first, then owner precedent, then `Other`. Never fails.
pub struct Categorizer {
    keywords: KeywordTable,
    precedents: Arc<PrecedentMemory>,
}

impl Categorizer {
    pub fn new(config: &CategorizerConfig, precedents: Arc<PrecedentMemory>) -> CoreResult<Self> {
        Ok(Self {
            keywords: config.keyword_table()?,
            precedents,
        })
    }

    pub fn categorize(&self, owner: &OwnerId, description: &str) -> Categorization {
        let normalized = normalize_description(description);
        if let Some((category, keyword)) = self.keywords.lookup(&normalized) {
            return Categorization {
                category,
                source: CategorySource::Keyword,
                matched_keyword: Some(keyword.to_string()),
            };
        }
        if let Some(category) = self.precedents.recall(owner, &normalized) {
            return Categorization {
                category,
                source: CategorySource::Precedent,
                matched_keyword: None,
            };
        }
        Categorization {
            category: Category::Other,
            source: CategorySource::Fallback,
            matched_keyword: None,
        }
    }

    pub fn categorize_all(&self, owner: &OwnerId, transactions: &mut [Transaction]) -> CategorizationSummary {
        let mut summary = CategorizationSummary::default();
        for tx in transactions.iter_mut() {
            let c = self.categorize(owner, tx.description());
            match c.source {
                CategorySource::Keyword => summary.keyword += 1,
                CategorySource::Precedent => summary.precedent += 1,
                _ => summary.fallback += 1,
            }
            tx.set_category(c.category, c.source);
        }
        summary
    }

    /// Records a user's explicit choice so later documents reuse it.
    pub fn remember(&self, owner: &OwnerId, description: &str, category: Category) {
        self.precedents
            .remember(owner, &normalize_description(description), category);
    }

    pub fn precedents(&self) -> &Arc<PrecedentMemory> {
        &self.precedents
    }
}
