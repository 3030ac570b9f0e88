//! Sync queue - durable FIFO of mutations not yet confirmed remotely.
//!
//! Entries are only removed once their remote call succeeded, or when the
//! drain drops them as permanently invalid.

use crate::error::StorageError;
use crate::kv::KeyValueStore;
use crate::now_millis;
use std::collections::BTreeSet;
use std::sync::Arc;
use tally_engine::{pending_sync_ids, ExpenseId, Snapshot, SyncEntry};

/// Key holding the queue.
pub const QUEUE_KEY: &str = "@sync_queue";

/// Ordered log of pending remote mutations. Index 0 is the oldest entry.
#[derive(Clone)]
pub struct SyncQueue {
    kv: Arc<dyn KeyValueStore>,
}

impl SyncQueue {
    /// Create a queue on top of a key-value backend.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Read the queue, reporting failures.
    pub async fn try_get_queue(&self) -> Result<Vec<SyncEntry>, StorageError> {
        let Some(raw) = self.kv.get(QUEUE_KEY).await? else {
            return Ok(Vec::new());
        };

        Snapshot::<SyncEntry>::from_json(&raw)
            .map(Snapshot::into_items)
            .map_err(|source| StorageError::Corrupt {
                key: QUEUE_KEY.to_string(),
                source,
            })
    }

    /// Read the queue, oldest first.
    ///
    /// Any failure reads as an empty queue. A corrupt queue therefore loses
    /// its unsynced mutations instead of wedging every later drain.
    pub async fn get_queue(&self) -> Vec<SyncEntry> {
        match self.try_get_queue().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read sync queue, treating as empty");
                Vec::new()
            }
        }
    }

    /// Number of queued entries.
    pub async fn len(&self) -> usize {
        self.get_queue().await.len()
    }

    /// Whether nothing is queued.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Append an entry and persist.
    pub async fn add_to_queue(&self, entry: SyncEntry) -> Result<(), StorageError> {
        let mut queue = self.load_for_write().await?;
        queue.push(entry);
        self.persist(&queue).await
    }

    /// Remove the entry currently at `index` and persist.
    ///
    /// The index must be current: after a removal every later entry shifts
    /// down by one. Out-of-range indices remove nothing.
    pub async fn remove_from_queue(&self, index: usize) -> Result<Option<SyncEntry>, StorageError> {
        let mut queue = self.load_for_write().await?;
        if index >= queue.len() {
            return Ok(None);
        }
        let removed = queue.remove(index);
        self.persist(&queue).await?;
        Ok(Some(removed))
    }

    /// Drop every entry.
    pub async fn clear_queue(&self) -> Result<(), StorageError> {
        self.kv.remove(QUEUE_KEY).await
    }

    /// Ids with an outstanding create or update.
    pub async fn pending_sync_ids(&self) -> BTreeSet<ExpenseId> {
        pending_sync_ids(&self.get_queue().await)
    }

    async fn persist(&self, queue: &[SyncEntry]) -> Result<(), StorageError> {
        let snapshot = Snapshot::new(queue.iter().collect::<Vec<_>>(), now_millis());
        let json = snapshot.to_json().map_err(|source| StorageError::Corrupt {
            key: QUEUE_KEY.to_string(),
            source,
        })?;
        self.kv.set(QUEUE_KEY, json).await
    }

    async fn load_for_write(&self) -> Result<Vec<SyncEntry>, StorageError> {
        match self.try_get_queue().await {
            Ok(queue) => Ok(queue),
            Err(e @ StorageError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "Discarding corrupt sync queue");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
