//! # Tally Client
//!
//! Offline-first expense repository.
//!
//! Writes land in local storage immediately and reach the remote store when
//! it is reachable; mutations that could not be sent wait in a durable sync
//! queue until the next drain. Reads merge the local and remote lists.
//!
//! ## Components
//!
//! - [`RecordStore`] - durable local expense list
//! - [`SyncQueue`] - durable FIFO of unsynced mutations
//! - [`RemoteStore`] - contract of the shared store ([`HttpRemoteStore`],
//!   [`MemoryRemoteStore`])
//! - [`HybridRepository`] - the public API tying them together
//! - [`ConnectivitySignal`] - online/offline flag that triggers drains
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tally_client::{spawn_reconnect_sync, ClientConfig, ConnectivitySignal};
//! use tally_engine::NewExpense;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let repository = Arc::new(config.open_repository().await?);
//!
//! let signal = ConnectivitySignal::new(true);
//! let _sync = spawn_reconnect_sync(repository.clone(), &signal);
//!
//! let coffee = repository
//!     .create(NewExpense::new("Coffee", 3.5, "2026-02-01"))
//!     .await?;
//! println!("saved {}", coffee.id);
//!
//! // Network lost and regained: the queue drains in the background.
//! signal.set_online(false);
//! signal.set_online(true);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connectivity;
pub mod error;
pub mod kv;
pub mod record_store;
pub mod remote;
pub mod repository;
pub mod sync_queue;

pub use config::{ClientConfig, ConfigError};
pub use connectivity::{spawn_reconnect_sync, ConnectivitySignal};
pub use error::{Error, RemoteError, Result, StorageError};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use record_store::{RecordStore, EXPENSES_KEY};
pub use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteCall, RemoteStore};
pub use repository::{DrainReport, HybridRepository, RepositoryOptions};
pub use sync_queue::{SyncQueue, QUEUE_KEY};

/// Wall clock in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> tally_engine::Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as tally_engine::Timestamp
}
