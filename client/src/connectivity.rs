//! Connectivity signal.
//!
//! A platform network monitor pushes booleans into a [`ConnectivitySignal`];
//! [`spawn_reconnect_sync`] keeps the repository's online flag in step and
//! drains the sync queue whenever the device comes back online.

use crate::repository::HybridRepository;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Observable online/offline flag.
#[derive(Debug)]
pub struct ConnectivitySignal {
    tx: watch::Sender<bool>,
}

impl ConnectivitySignal {
    /// Create a signal with an initial status.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Publish a status. Subscribers are only woken when it changes.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
    }

    /// Latest published status.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver for status changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Forward connectivity changes to `repository` and drain its sync queue on
/// every offline to online transition.
///
/// The current status is applied immediately, and counts as a transition if
/// the repository believed it was offline. The task ends once the signal is
/// dropped.
pub fn spawn_reconnect_sync(
    repository: Arc<HybridRepository>,
    signal: &ConnectivitySignal,
) -> JoinHandle<()> {
    let mut rx = signal.subscribe();

    tokio::spawn(async move {
        let mut online = repository.is_online();

        loop {
            let next = *rx.borrow_and_update();
            repository.set_online_status(next);

            if next && !online {
                let report = repository.process_sync_queue().await;
                tracing::info!(
                    synced = report.synced,
                    remaining = report.remaining,
                    "Back online, sync queue drained"
                );
            }
            online = next;

            if rx.changed().await.is_err() {
                break;
            }
        }

        tracing::debug!("Connectivity signal dropped, reconnect sync stopped");
    })
}
