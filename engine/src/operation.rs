//! Sync queue entries.
//!
//! A mutation that could not be confirmed against the remote store is kept
//! as a [`SyncEntry`] until it is replayed. Entries serialize as
//! `{"type": "create", "expense": {...}}` / `{"type": "delete", "id": "..."}`.

use crate::{Expense, ExpenseId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of a queued mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncEntryKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for SyncEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEntryKind::Create => write!(f, "create"),
            SyncEntryKind::Update => write!(f, "update"),
            SyncEntryKind::Delete => write!(f, "delete"),
        }
    }
}

/// A mutation waiting to reach the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyncEntry {
    Create { expense: Expense },
    Update { expense: Expense },
    Delete { id: ExpenseId },
}

impl SyncEntry {
    /// Queue a create.
    pub fn create(expense: Expense) -> Self {
        SyncEntry::Create { expense }
    }

    /// Queue an update.
    pub fn update(expense: Expense) -> Self {
        SyncEntry::Update { expense }
    }

    /// Queue a delete.
    pub fn delete(id: impl Into<ExpenseId>) -> Self {
        SyncEntry::Delete { id: id.into() }
    }

    /// Get the entry kind.
    pub fn kind(&self) -> SyncEntryKind {
        match self {
            SyncEntry::Create { .. } => SyncEntryKind::Create,
            SyncEntry::Update { .. } => SyncEntryKind::Update,
            SyncEntry::Delete { .. } => SyncEntryKind::Delete,
        }
    }

    /// Get the expense ID this entry targets.
    pub fn expense_id(&self) -> &ExpenseId {
        match self {
            SyncEntry::Create { expense } | SyncEntry::Update { expense } => &expense.id,
            SyncEntry::Delete { id } => id,
        }
    }

    /// Get the carried expense (create and update only).
    pub fn expense(&self) -> Option<&Expense> {
        match self {
            SyncEntry::Create { expense } | SyncEntry::Update { expense } => Some(expense),
            SyncEntry::Delete { .. } => None,
        }
    }

    /// Whether this entry holds a local copy that must survive a merge.
    pub fn is_pending_write(&self) -> bool {
        !matches!(self, SyncEntry::Delete { .. })
    }
}

/// Ids with an outstanding create or update.
///
/// Deletes are not included: a deleted record is already gone from the local
/// list, so there is nothing to protect during a merge.
pub fn pending_sync_ids<'a>(
    entries: impl IntoIterator<Item = &'a SyncEntry>,
) -> BTreeSet<ExpenseId> {
    entries
        .into_iter()
        .filter(|entry| entry.is_pending_write())
        .map(|entry| entry.expense_id().clone())
        .collect()
}
