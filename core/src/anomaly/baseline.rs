//! Per-owner, per-category running statistics.
//!
//! The store is the only state shared across documents. Updates are
//! optimistic: read a versioned snapshot, compute, then compare-and-swap,
//! retrying when another document of the same owner got there first.

use crate::categorize::taxonomy::Category;
use crate::documents::model::OwnerId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBaseline {
    pub count: u64,
    pub mean: f64,
    m2: f64,
    /// Bumped on every accepted update; 0 means no data yet.
    pub version: u64,
}

impl CategoryBaseline {
    /// Welford's update. Returns the next baseline and leaves `self` untouched.
    pub fn observe(&self, amount: f64) -> Self {
        let count = self.count + 1;
        let delta = amount - self.mean;
        let mean = self.mean + delta / count as f64;
        let m2 = self.m2 + delta * (amount - mean);
        Self {
            count,
            mean,
            m2,
            version: self.version + 1,
        }
    }

    /// Population variance (`M2 / n`).
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.m2 / self.count as f64).max(0.0)
        }
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[derive(Debug, Default)]
pub struct BaselineStore {
    inner: DashMap<(OwnerId, Category), CategoryBaseline>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, owner: &OwnerId, category: Category) -> CategoryBaseline {
        self.inner
            .get(&(owner.clone(), category))
            .map(|b| *b)
            .unwrap_or_default()
    }

    /// Installs `next` only if the stored version still equals `expected_version`.
    /// On mismatch returns the baseline that won.
    pub fn compare_and_swap(
        &self,
        owner: &OwnerId,
        category: Category,
        expected_version: u64,
        next: CategoryBaseline,
    ) -> Result<(), CategoryBaseline> {
        match self.inner.entry((owner.clone(), category)) {
            Entry::Occupied(mut e) => {
                if e.get().version == expected_version {
                    e.insert(next);
                    Ok(())
                } else {
                    Err(*e.get())
                }
            }
            Entry::Vacant(v) => {
                if expected_version == 0 {
                    v.insert(next);
                    Ok(())
                } else {
                    Err(CategoryBaseline::default())
                }
            }
        }
    }

    /// Judges `amount` against the current baseline, then folds it in.
    /// `judge` sees the pre-update snapshot and may run more than once on contention.
    pub fn observe_with<R>(
        &self,
        owner: &OwnerId,
        category: Category,
        amount: f64,
        mut judge: impl FnMut(&CategoryBaseline) -> R,
    ) -> (R, CategoryBaseline) {
        let mut attempts = 0u32;
        loop {
            let before = self.snapshot(owner, category);
            let verdict = judge(&before);
            let after = before.observe(amount);
            match self.compare_and_swap(owner, category, before.version, after) {
                Ok(()) => return (verdict, after),
                Err(winner) => {
                    attempts += 1;
                    tracing::trace!(
                        owner_id = %owner,
                        category = category.as_str(),
                        attempts,
                        winner_version = winner.version,
                        "baseline update raced; retrying"
                    );
                }
            }
        }
    }

    pub fn for_owner(&self, owner: &OwnerId) -> BTreeMap<Category, CategoryBaseline> {
        self.inner
            .iter()
            .filter(|e| &e.key().0 == owner)
            .map(|e| (e.key().1, *e.value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn welford_matches_textbook_values() {
        let b = [50.0, 52.0, 48.0]
            .iter()
            .fold(CategoryBaseline::default(), |b, x| b.observe(*x));
        assert_eq!(b.count, 3);
        assert!((b.mean - 50.0).abs() < 1e-9);
        assert!((b.stddev() - (8.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(b.version, 3);
    }

    #[test]
    fn stale_version_is_rejected() {
        let store = BaselineStore::new();
        let owner = OwnerId::from("u1");
        let first = CategoryBaseline::default().observe(10.0);
        store.compare_and_swap(&owner, Category::Food, 0, first).unwrap();
        let stale = CategoryBaseline::default().observe(99.0);
        let err = store
            .compare_and_swap(&owner, Category::Food, 0, stale)
            .unwrap_err();
        assert_eq!(err.version, 1);
        assert_eq!(store.snapshot(&owner, Category::Food).mean, 10.0);
    }

    #[test]
    fn judge_sees_pre_update_snapshot() {
        let store = BaselineStore::new();
        let owner = OwnerId::from("u1");
        let (seen, after) = store.observe_with(&owner, Category::Food, 40.0, |b| b.count);
        assert_eq!(seen, 0);
        assert_eq!(after.count, 1);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let store = Arc::new(BaselineStore::new());
        let owner = OwnerId::from("u1");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let owner = owner.clone();
                std::thread::spawn(move || {
                    for j in 0..250 {
                        store.observe_with(&owner, Category::Travel, (i * 250 + j) as f64, |_| ());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let b = store.snapshot(&owner, Category::Travel);
        assert_eq!(b.count, 2000);
        assert!((b.mean - 999.5).abs() < 1e-6);
        assert_eq!(store.for_owner(&owner).len(), 1);
    }
}
