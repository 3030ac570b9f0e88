//! Remote store contract.
//!
//! The remote store is the shared, authoritative copy of the expense list
//! that other devices write to as well. Calls may fail at any time; the
//! repository turns failed writes into sync queue entries.

mod http;
mod memory;

pub use http::HttpRemoteStore;
pub use memory::{MemoryRemoteStore, RemoteCall};

use crate::error::RemoteError;
use async_trait::async_trait;
use tally_engine::Expense;

/// Trait for remote expense stores
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch every expense
    async fn list(&self) -> Result<Vec<Expense>, RemoteError>;

    /// Overwrite the whole collection
    async fn replace_all(&self, expenses: &[Expense]) -> Result<(), RemoteError>;

    /// Store an expense under its id, overwriting any existing one
    async fn create(&self, expense: &Expense) -> Result<(), RemoteError>;

    /// Merge an expense into the stored one. Optional fields that are unset
    /// keep their stored value.
    async fn update(&self, expense: &Expense) -> Result<(), RemoteError>;

    /// Delete by id. Deleting a missing id succeeds.
    async fn remove(&self, id: &str) -> Result<(), RemoteError>;
}

/// Apply merge-update semantics to a stored expense.
pub(crate) fn merge_into(stored: &mut Expense, patch: &Expense) {
    stored.title = patch.title.clone();
    stored.amount = patch.amount;
    stored.date = patch.date.clone();
    if patch.category.is_some() {
        stored.category = patch.category.clone();
    }
    if patch.note.is_some() {
        stored.note = patch.note.clone();
    }
    if patch.payment_method.is_some() {
        stored.payment_method = patch.payment_method.clone();
    }
}
