//! Reconciliation of the local expense list with the remote one.
//!
//! This is the core of determinism. Given the local list, the remote list
//! and the ids with outstanding local writes, this module produces the list
//! that becomes the new local state.
//!
//! # Algorithm
//!
//! 1. Start from the remote list (other devices may have written there)
//! 2. Overlay local records according to the [`MergeStrategy`]
//! 3. Append local records the remote does not have
//! 4. Sort by date descending; ties keep merge insertion order
//!
//! The result is the union of both lists. For ids present on both sides,
//! last writer wins, where "last" means "has an outstanding local
//! operation". Timestamps are not compared.
//!
//! Without tombstones a local-only record cannot be told apart from one
//! another device deleted, so local-only records are always kept.

use crate::{Expense, ExpenseId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Which local records override the remote copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    /// Remote is authoritative except for ids with a pending local write (default)
    #[default]
    PendingLocalWins,
    /// Every local record overrides the remote copy, pending or not.
    /// Hides edits other devices made; kept for single-device setups.
    LocalWins,
}

impl std::str::FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending-local-wins" | "pending" => Ok(MergeStrategy::PendingLocalWins),
            "local-wins" | "local" => Ok(MergeStrategy::LocalWins),
            other => Err(format!("unknown merge strategy: {}", other)),
        }
    }
}

/// Result of a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// Merged list, sorted by date descending
    pub expenses: Vec<Expense>,
    /// Local ids that overrode or were added to the remote baseline
    pub kept_local: Vec<ExpenseId>,
    /// Local ids absent remotely and kept without a pending write
    pub local_only: Vec<ExpenseId>,
}

/// Insertion-ordered, id-deduplicated list under construction.
#[derive(Debug, Default)]
struct MergedList {
    expenses: Vec<Expense>,
    index: HashMap<ExpenseId, usize>,
}

impl MergedList {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            expenses: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or overwrite. An overwrite keeps the original slot.
    fn upsert(&mut self, expense: Expense) {
        match self.index.get(&expense.id) {
            Some(&slot) => self.expenses[slot] = expense,
            None => {
                self.index.insert(expense.id.clone(), self.expenses.len());
                self.expenses.push(expense);
            }
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn into_sorted(mut self) -> Vec<Expense> {
        // Stable: equal dates keep insertion order.
        self.expenses.sort_by(|a, b| b.date.cmp(&a.date));
        self.expenses
    }
}

/// Merges local and remote expense lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    strategy: MergeStrategy,
}

impl Reconciler {
    /// Create a new reconciler.
    pub fn new(strategy: MergeStrategy) -> Self {
        Self { strategy }
    }

    /// The configured strategy.
    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Merge `local` into `remote`.
    ///
    /// `pending` is the set of ids with an outstanding create or update in
    /// the sync queue.
    pub fn merge(
        &self,
        local: Vec<Expense>,
        remote: Vec<Expense>,
        pending: &BTreeSet<ExpenseId>,
    ) -> MergeOutcome {
        let mut merged = MergedList::with_capacity(remote.len() + local.len());
        for expense in remote {
            merged.upsert(expense);
        }

        let mut kept_local = Vec::new();
        let mut local_only = Vec::new();

        for expense in local {
            let overrides = match self.strategy {
                MergeStrategy::PendingLocalWins => pending.contains(&expense.id),
                MergeStrategy::LocalWins => true,
            };

            if overrides {
                kept_local.push(expense.id.clone());
                merged.upsert(expense);
            } else if !merged.contains(&expense.id) {
                local_only.push(expense.id.clone());
                merged.upsert(expense);
            }
        }

        MergeOutcome {
            expenses: merged.into_sorted(),
            kept_local,
            local_only,
        }
    }
}

/// Sort expenses by date descending, keeping the relative order of ties.
pub fn sort_by_date_desc(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.date.cmp(&a.date));
}
