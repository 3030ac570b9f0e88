//! Record store - the local copy of the expense list.
//!
//! The whole list lives under one key as a [`Snapshot`]. Every mutation is a
//! full read/modify/write, which is fine for a personal dataset with one
//! writer at a time but not for concurrent writers.

use crate::error::StorageError;
use crate::kv::KeyValueStore;
use crate::now_millis;
use std::sync::Arc;
use tally_engine::{Expense, Snapshot};

/// Key holding the expense list.
pub const EXPENSES_KEY: &str = "@expenses_list";

/// Local, durable expense list.
#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KeyValueStore>,
}

impl RecordStore {
    /// Create a record store on top of a key-value backend.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Read the full list, reporting failures.
    pub async fn try_list(&self) -> Result<Vec<Expense>, StorageError> {
        let Some(raw) = self.kv.get(EXPENSES_KEY).await? else {
            return Ok(Vec::new());
        };

        Snapshot::<Expense>::from_json(&raw)
            .map(Snapshot::into_items)
            .map_err(|source| StorageError::Corrupt {
                key: EXPENSES_KEY.to_string(),
                source,
            })
    }

    /// Read the full list. Missing or unreadable data reads as empty.
    pub async fn list(&self) -> Vec<Expense> {
        match self.try_list().await {
            Ok(expenses) => expenses,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read local expenses, treating as empty");
                Vec::new()
            }
        }
    }

    /// Look up one expense.
    pub async fn get(&self, id: &str) -> Option<Expense> {
        self.list().await.into_iter().find(|e| e.id == id)
    }

    /// Overwrite the stored list.
    pub async fn replace_all(&self, expenses: &[Expense]) -> Result<(), StorageError> {
        let snapshot = Snapshot::new(expenses.iter().collect::<Vec<_>>(), now_millis());
        let json = snapshot.to_json().map_err(|source| StorageError::Corrupt {
            key: EXPENSES_KEY.to_string(),
            source,
        })?;
        self.kv.set(EXPENSES_KEY, json).await
    }

    /// Append an expense. An existing expense with the same id is replaced.
    pub async fn create(&self, expense: &Expense) -> Result<(), StorageError> {
        let mut current = self.load_for_write().await?;
        match current.iter_mut().find(|e| e.id == expense.id) {
            Some(existing) => *existing = expense.clone(),
            None => current.push(expense.clone()),
        }
        self.replace_all(&current).await
    }

    /// Replace the expense with the same id. Returns whether it was found.
    pub async fn update(&self, expense: &Expense) -> Result<bool, StorageError> {
        let mut current = self.load_for_write().await?;
        let Some(existing) = current.iter_mut().find(|e| e.id == expense.id) else {
            tracing::debug!(id = %expense.id, "Update for unknown local expense ignored");
            return Ok(false);
        };
        *existing = expense.clone();
        self.replace_all(&current).await?;
        Ok(true)
    }

    /// Delete by id. Returns whether anything was removed.
    pub async fn remove(&self, id: &str) -> Result<bool, StorageError> {
        let mut current = self.load_for_write().await?;
        let before = current.len();
        current.retain(|e| e.id != id);
        if current.len() == before {
            return Ok(false);
        }
        self.replace_all(&current).await?;
        Ok(true)
    }

    /// Current list as the base of a write.
    ///
    /// Corrupt data is replaced (cold start), but an unreachable backend is
    /// reported so the write does not clobber data it could not read.
    async fn load_for_write(&self) -> Result<Vec<Expense>, StorageError> {
        match self.try_list().await {
            Ok(expenses) => Ok(expenses),
            Err(e @ StorageError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "Discarding corrupt local expense list");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
