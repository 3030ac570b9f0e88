//! Snapshot envelope for persisting collections.
//!
//! Snapshots are the bridge between in-memory lists and the key-value store.
//! Both the expense list and the sync queue are persisted as one snapshot
//! each, so every write replaces the whole collection.

use crate::{error::Result, Error, Timestamp};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time copy of a persisted collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<T> {
    /// Snapshot format version
    pub format_version: u32,
    /// When the snapshot was written (milliseconds since epoch)
    pub saved_at: Timestamp,
    /// Collection contents, in order
    pub items: Vec<T>,
}

/// On-disk forms accepted by [`Snapshot::from_json`].
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredForm<T> {
    Envelope(Snapshot<T>),
    /// Bare array written before the envelope existed
    Legacy(Vec<T>),
}

impl<T> Snapshot<T> {
    /// Create a snapshot of `items`.
    pub fn new(items: Vec<T>, saved_at: Timestamp) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            saved_at,
            items,
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the snapshot holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take the items out.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T: Serialize> Snapshot<T> {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }
}

impl<T: DeserializeOwned> Snapshot<T> {
    /// Deserialize from JSON.
    ///
    /// Accepts the envelope or a bare JSON array. A bare array gets
    /// `saved_at = 0`.
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: StoredForm<T> =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        let snapshot = match stored {
            StoredForm::Envelope(snapshot) => snapshot,
            StoredForm::Legacy(items) => Snapshot::new(items, 0),
        };

        // Validate format version
        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::UnsupportedSnapshotVersion {
                found: snapshot.format_version,
                supported: SNAPSHOT_FORMAT_VERSION,
            });
        }

        Ok(snapshot)
    }
}

/// Metadata about a snapshot (for debugging/display).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub format_version: u32,
    pub saved_at: Timestamp,
    pub item_count: usize,
}

impl<T> From<&Snapshot<T>> for SnapshotMetadata {
    fn from(snapshot: &Snapshot<T>) -> Self {
        Self {
            format_version: snapshot.format_version,
            saved_at: snapshot.saved_at,
            item_count: snapshot.items.len(),
        }
    }
}
