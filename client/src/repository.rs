//! Hybrid repository - local-first reads and writes with background sync.
//!
//! Every write lands in the [`RecordStore`] first. When online, the same
//! write is attempted against the remote store; a failed or skipped remote
//! write becomes a [`SyncEntry`] that [`HybridRepository::process_sync_queue`]
//! replays later. Reads reconcile the local list with the remote one.

use crate::error::{Error, RemoteError, Result};
use crate::kv::KeyValueStore;
use crate::now_millis;
use crate::record_store::RecordStore;
use crate::remote::RemoteStore;
use crate::sync_queue::SyncQueue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tally_engine::{
    normalize_amount, validate_expense, validate_new_expense, Expense, ExpenseId, IdGenerator,
    MergeStrategy, NewExpense, Reconciler, SyncEntry, ValidationPolicy,
};
use tokio::sync::Mutex;

/// Repository behavior that does not involve I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryOptions {
    /// When create/update input is validated
    pub validation: ValidationPolicy,
    /// How local and remote lists are merged on read
    pub merge_strategy: MergeStrategy,
    /// Deadline for every remote call
    pub remote_timeout: Duration,
    /// Initial connectivity
    pub start_online: bool,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            validation: ValidationPolicy::default(),
            merge_strategy: MergeStrategy::default(),
            remote_timeout: Duration::from_secs(10),
            start_online: true,
        }
    }
}

/// Outcome of one sync queue drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    /// Entries the remote accepted
    pub synced: usize,
    /// Malformed or rejected entries removed without syncing
    pub dropped: usize,
    /// Entries left in place after a transient failure
    pub failed: usize,
    /// Queue length after the drain
    pub remaining: usize,
}

impl DrainReport {
    /// Whether anything was attempted.
    pub fn is_empty(&self) -> bool {
        self.synced == 0 && self.dropped == 0 && self.failed == 0
    }
}

/// What happened to one replayed entry.
enum Replay {
    Synced,
    Dropped(String),
    Failed(RemoteError),
}

/// Clears the reconciliation flag when a refresh ends, even if cancelled.
struct ReconcileGuard<'a>(&'a AtomicBool);

impl Drop for ReconcileGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Local-first expense repository.
///
/// Create one per data directory and share it behind an `Arc`.
pub struct HybridRepository {
    records: RecordStore,
    queue: SyncQueue,
    remote: Option<Arc<dyn RemoteStore>>,
    reconciler: Reconciler,
    options: RepositoryOptions,
    online: AtomicBool,
    reconciling: AtomicBool,
    ids: Mutex<IdGenerator>,
    drain_lock: Mutex<()>,
}

impl HybridRepository {
    /// Create a repository over a local key-value store and an optional remote.
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        remote: Option<Arc<dyn RemoteStore>>,
        options: RepositoryOptions,
    ) -> Self {
        Self {
            records: RecordStore::new(kv.clone()),
            queue: SyncQueue::new(kv),
            remote,
            reconciler: Reconciler::new(options.merge_strategy),
            online: AtomicBool::new(options.start_online),
            reconciling: AtomicBool::new(false),
            ids: Mutex::new(IdGenerator::new()),
            drain_lock: Mutex::new(()),
            options,
        }
    }

    /// Create a repository without a remote store. Every write is queued.
    pub fn local_only(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::new(kv, None, RepositoryOptions::default())
    }

    /// The configured options.
    pub fn options(&self) -> &RepositoryOptions {
        &self.options
    }

    /// Whether a remote store is configured.
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// The local record store.
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// The sync queue.
    pub fn queue(&self) -> &SyncQueue {
        &self.queue
    }

    /// Record a connectivity change.
    pub fn set_online_status(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            tracing::info!(online, "Connectivity changed");
        }
    }

    /// Current connectivity.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Whether a reconciliation or a queue drain is running.
    pub fn is_syncing(&self) -> bool {
        self.reconciling.load(Ordering::Acquire) || self.drain_lock.try_lock().is_err()
    }

    /// Ids with an outstanding create or update.
    pub async fn pending_sync_ids(&self) -> BTreeSet<ExpenseId> {
        self.queue.pending_sync_ids().await
    }

    /// Look up one expense in the local store.
    pub async fn get(&self, id: &str) -> Option<Expense> {
        self.records.get(id).await
    }

    /// List expenses, reconciling with the remote store when online.
    ///
    /// Never fails: remote errors fall back to the local list, and an
    /// unreadable local store reads as empty. If another reconciliation is
    /// already running the local list is returned as is.
    pub async fn list(&self) -> Vec<Expense> {
        match self.refresh().await {
            Some(expenses) => expenses,
            None => self.records.list().await,
        }
    }

    /// Reconcile and return the result, or `None` when skipped because
    /// another reconciliation is in progress.
    pub async fn refresh(&self) -> Option<Vec<Expense>> {
        if self
            .reconciling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Reconciliation already running, skipping");
            return None;
        }
        let _guard = ReconcileGuard(&self.reconciling);

        Some(self.reconcile().await)
    }

    async fn reconcile(&self) -> Vec<Expense> {
        let local = self.records.list().await;

        let Some(remote) = self.remote_target() else {
            return local;
        };

        let remote_expenses = match self.with_deadline(remote.list()).await {
            Ok(expenses) => expenses,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch remote expenses, using local data");
                return local;
            }
        };

        let pending = self.queue.pending_sync_ids().await;
        let outcome = self.reconciler.merge(local, remote_expenses, &pending);

        if !outcome.local_only.is_empty() {
            tracing::debug!(
                count = outcome.local_only.len(),
                "Kept local expenses the remote does not have"
            );
        }

        if let Err(e) = self.records.replace_all(&outcome.expenses).await {
            tracing::warn!(error = %e, "Failed to persist reconciled expenses");
        }

        tracing::info!(
            count = outcome.expenses.len(),
            kept_local = outcome.kept_local.len(),
            "Reconciled with remote"
        );
        outcome.expenses
    }

    /// Create an expense and return it with its generated id.
    pub async fn create(&self, fields: NewExpense) -> Result<Expense> {
        if self.options.validation == ValidationPolicy::Eager {
            validate_new_expense(&fields)?;
        }

        let expense = Expense::from_new(self.next_id().await, fields);
        self.records.create(&expense).await?;

        match self.remote_target() {
            Some(remote) => match self.with_deadline(remote.create(&expense)).await {
                Ok(()) => tracing::debug!(id = %expense.id, "Synced create"),
                Err(e) => {
                    self.on_remote_failure(e, SyncEntry::create(expense.clone()))
                        .await?
                }
            },
            None => self.enqueue(SyncEntry::create(expense.clone())).await,
        }

        Ok(expense)
    }

    /// Replace an expense by id.
    pub async fn update(&self, expense: Expense) -> Result<()> {
        if self.options.validation == ValidationPolicy::Eager {
            validate_expense(&expense)?;
        }

        if !self.records.update(&expense).await? {
            tracing::debug!(id = %expense.id, "Updating an expense missing locally");
        }

        match self.remote_target() {
            Some(remote) => match self.with_deadline(remote.update(&expense)).await {
                Ok(()) => tracing::debug!(id = %expense.id, "Synced update"),
                Err(e) => self.on_remote_failure(e, SyncEntry::update(expense)).await?,
            },
            None => self.enqueue(SyncEntry::update(expense)).await,
        }
        Ok(())
    }

    /// Delete an expense by id.
    pub async fn remove(&self, id: &str) -> Result<()> {
        self.records.remove(id).await?;

        match self.remote_target() {
            Some(remote) => match self.with_deadline(remote.remove(id)).await {
                Ok(()) => tracing::debug!(id, "Synced delete"),
                Err(e) => self.on_remote_failure(e, SyncEntry::delete(id)).await?,
            },
            None => self.enqueue(SyncEntry::delete(id)).await,
        }
        Ok(())
    }

    /// Overwrite the whole collection, locally and (when online) remotely.
    ///
    /// A failed remote bulk write is logged and not queued.
    pub async fn replace_all(&self, expenses: Vec<Expense>) -> Result<()> {
        if self.options.validation == ValidationPolicy::Eager {
            for expense in &expenses {
                validate_expense(expense)?;
            }
        }

        self.records.replace_all(&expenses).await?;

        if let Some(remote) = self.remote_target() {
            match self.with_deadline(remote.replace_all(&expenses)).await {
                Ok(()) => tracing::info!(count = expenses.len(), "Synced bulk replace"),
                Err(e) => tracing::warn!(error = %e, "Bulk replace not synced"),
            }
        }
        Ok(())
    }

    /// Seed an empty store on first run and return the current list.
    ///
    /// The seed is only written when the reconciled list is empty. An
    /// unreadable local store is an error here so the seed never overwrites
    /// data that exists but could not be read.
    pub async fn bootstrap(&self, seed: Vec<Expense>) -> Result<Vec<Expense>> {
        self.records.try_list().await?;

        let current = self.list().await;
        if !current.is_empty() {
            return Ok(current);
        }

        tracing::info!(count = seed.len(), "Seeding empty expense store");
        self.replace_all(seed.clone()).await?;
        Ok(seed)
    }

    /// Replay the sync queue against the remote store, oldest entry first.
    ///
    /// No-op when offline or without a remote. Entries with an invalid
    /// amount, or that the remote rejects outright, are dropped; entries that
    /// fail transiently stay queued for the next drain.
    pub async fn process_sync_queue(&self) -> DrainReport {
        let Some(remote) = self.remote_target() else {
            tracing::debug!("Offline or no remote store, not draining");
            return DrainReport {
                remaining: self.queue.len().await,
                ..DrainReport::default()
            };
        };

        let _drain = self.drain_lock.lock().await;

        let entries = self.queue.get_queue().await;
        if entries.is_empty() {
            return DrainReport::default();
        }
        tracing::info!(count = entries.len(), "Processing sync queue");

        let mut report = DrainReport::default();
        let mut removed = 0;

        for (position, entry) in entries.iter().enumerate() {
            match self.replay(remote.as_ref(), entry).await {
                Replay::Synced => {
                    report.synced += 1;
                    tracing::debug!(kind = %entry.kind(), id = %entry.expense_id(), "Synced queued entry");
                }
                Replay::Dropped(reason) => {
                    report.dropped += 1;
                    tracing::warn!(
                        kind = %entry.kind(),
                        id = %entry.expense_id(),
                        reason = %reason,
                        "Dropping queued entry"
                    );
                }
                Replay::Failed(e) => {
                    report.failed += 1;
                    tracing::error!(
                        kind = %entry.kind(),
                        id = %entry.expense_id(),
                        error = %e,
                        "Failed to sync queued entry"
                    );
                    continue;
                }
            }

            // Earlier removals in this pass shifted the entry down.
            match self.queue.remove_from_queue(position - removed).await {
                Ok(Some(_)) => removed += 1,
                Ok(None) => {
                    tracing::warn!(position, "Queued entry vanished during drain");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to remove synced entry from queue");
                }
            }
        }

        report.remaining = self.queue.len().await;
        tracing::info!(
            synced = report.synced,
            dropped = report.dropped,
            failed = report.failed,
            remaining = report.remaining,
            "Sync queue processed"
        );
        report
    }

    async fn replay(&self, remote: &dyn RemoteStore, entry: &SyncEntry) -> Replay {
        let result = match entry {
            SyncEntry::Create { expense } | SyncEntry::Update { expense } => {
                let expense = match normalize_amount(expense) {
                    Ok(expense) => expense,
                    Err(e) => return Replay::Dropped(e.to_string()),
                };
                if matches!(entry, SyncEntry::Create { .. }) {
                    self.with_deadline(remote.create(&expense)).await
                } else {
                    self.with_deadline(remote.update(&expense)).await
                }
            }
            SyncEntry::Delete { id } => self.with_deadline(remote.remove(id)).await,
        };

        match result {
            Ok(()) => Replay::Synced,
            Err(e) if e.is_rejection() => Replay::Dropped(e.to_string()),
            Err(e) => Replay::Failed(e),
        }
    }

    /// Handle a failed direct write: rejections are returned, anything else
    /// is queued for retry.
    async fn on_remote_failure(&self, error: RemoteError, entry: SyncEntry) -> Result<()> {
        if error.is_rejection() {
            tracing::warn!(id = %entry.expense_id(), error = %error, "Remote rejected write");
            return Err(Error::Remote(error));
        }

        tracing::warn!(
            kind = %entry.kind(),
            id = %entry.expense_id(),
            error = %error,
            "Remote write failed, queuing"
        );
        self.enqueue(entry).await;
        Ok(())
    }

    async fn enqueue(&self, entry: SyncEntry) {
        let kind = entry.kind();
        let id = entry.expense_id().clone();
        if let Err(e) = self.queue.add_to_queue(entry).await {
            tracing::error!(%kind, %id, error = %e, "Failed to queue mutation, it will not sync");
        }
    }

    /// The remote store, if configured and currently reachable.
    fn remote_target(&self) -> Option<Arc<dyn RemoteStore>> {
        if !self.is_online() {
            return None;
        }
        self.remote.clone()
    }

    async fn with_deadline<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, RemoteError>>,
    ) -> std::result::Result<T, RemoteError> {
        let deadline = self.options.remote_timeout;
        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(deadline)),
        }
    }

    async fn next_id(&self) -> ExpenseId {
        let entropy = uuid::Uuid::new_v4().as_u128() as u64;
        self.ids.lock().await.next_id(now_millis(), entropy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;
    use crate::remote::{MemoryRemoteStore, RemoteCall};

    struct Fixture {
        kv: Arc<MemoryKeyValueStore>,
        remote: Arc<MemoryRemoteStore>,
        repository: HybridRepository,
    }

    fn fixture_with(options: RepositoryOptions) -> Fixture {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let remote = Arc::new(MemoryRemoteStore::new());
        let repository = HybridRepository::new(
            kv.clone(),
            Some(remote.clone() as Arc<dyn RemoteStore>),
            options,
        );
        Fixture {
            kv,
            remote,
            repository,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RepositoryOptions::default())
    }

    fn coffee() -> NewExpense {
        NewExpense::new("Coffee", 3.5, "2026-02-01")
    }

    #[tokio::test]
    async fn online_create_goes_straight_to_remote() {
        let f = fixture();
        let created = f.repository.create(coffee()).await.unwrap();

        assert_eq!(f.repository.get(&created.id).await, Some(created.clone()));
        assert_eq!(f.remote.get(&created.id).await, Some(created));
        assert!(f.repository.queue().is_empty().await);
    }

    #[tokio::test]
    async fn offline_create_is_queued() {
        let f = fixture();
        f.repository.set_online_status(false);

        let created = f.repository.create(coffee()).await.unwrap();

        assert_eq!(f.repository.records().list().await, vec![created.clone()]);
        assert_eq!(
            f.repository.queue().get_queue().await,
            vec![SyncEntry::create(created.clone())]
        );
        assert!(f.repository.pending_sync_ids().await.contains(&created.id));
        assert!(f.remote.calls().await.is_empty());
    }

    #[tokio::test]
    async fn failed_remote_write_is_queued() {
        let f = fixture();
        f.remote.fail_next(1);

        let created = f.repository.create(coffee()).await.unwrap();

        assert_eq!(f.repository.queue().len().await, 1);
        assert!(f.remote.get(&created.id).await.is_none());
        assert_eq!(f.repository.get(&created.id).await, Some(created));
    }

    #[tokio::test]
    async fn rejected_direct_write_is_reported_not_queued() {
        let f = fixture();
        let result = f
            .repository
            .create(NewExpense::new("", 3.5, "2026-02-01"))
            .await;

        assert!(matches!(result, Err(Error::Remote(_))));
        assert!(f.repository.queue().is_empty().await);
        assert_eq!(f.repository.records().list().await.len(), 1);
    }

    #[tokio::test]
    async fn rejected_direct_write_survives_next_list() {
        let f = fixture();
        let result = f
            .repository
            .create(NewExpense::new("", 3.5, "2026-02-01"))
            .await;
        assert!(matches!(result, Err(Error::Remote(_))));
        let local = f.repository.records().list().await;

        let listed = f.repository.list().await;

        assert_eq!(listed, local);
        assert_eq!(f.repository.records().list().await, local);
    }

    #[tokio::test]
    async fn eager_validation_rejects_before_writing() {
        let f = fixture_with(RepositoryOptions {
            validation: ValidationPolicy::Eager,
            ..RepositoryOptions::default()
        });

        let result = f
            .repository
            .create(NewExpense::new("Refund", -5.0, "2026-02-01"))
            .await;

        assert!(matches!(result, Err(Error::Invalid(_))));
        assert!(f.repository.records().list().await.is_empty());
        assert!(f.remote.calls().await.is_empty());
    }

    #[tokio::test]
    async fn local_write_failure_is_an_error() {
        let f = fixture();
        f.kv.set_failing(true);

        let result = f.repository.create(coffee()).await;

        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(f.remote.calls().await.is_empty());
    }

    #[tokio::test]
    async fn update_and_remove_follow_the_same_path() {
        let f = fixture();
        let created = f.repository.create(coffee()).await.unwrap();

        f.repository.set_online_status(false);
        let edited = Expense {
            amount: 4.25,
            ..created.clone()
        };
        f.repository.update(edited.clone()).await.unwrap();
        f.repository.remove(&created.id).await.unwrap();

        let queue = f.repository.queue().get_queue().await;
        assert_eq!(
            queue,
            vec![SyncEntry::update(edited), SyncEntry::delete(created.id.clone())]
        );
        assert!(f.repository.records().list().await.is_empty());
    }

    #[tokio::test]
    async fn drain_replays_and_empties_queue() {
        let f = fixture();
        f.repository.set_online_status(false);
        let created = f.repository.create(coffee()).await.unwrap();

        f.repository.set_online_status(true);
        let report = f.repository.process_sync_queue().await;

        assert_eq!(
            report,
            DrainReport {
                synced: 1,
                dropped: 0,
                failed: 0,
                remaining: 0
            }
        );
        assert!(f.remote.get(&created.id).await.is_some());
        assert!(f.repository.pending_sync_ids().await.is_empty());

        // Second drain has nothing to do.
        assert!(f.repository.process_sync_queue().await.is_empty());
    }

    #[tokio::test]
    async fn drain_is_a_noop_offline() {
        let f = fixture();
        f.repository.set_online_status(false);
        f.repository.create(coffee()).await.unwrap();

        let report = f.repository.process_sync_queue().await;

        assert!(report.is_empty());
        assert_eq!(report.remaining, 1);
        assert!(f.remote.calls().await.is_empty());
    }

    #[tokio::test]
    async fn drain_drops_invalid_amounts_without_calling_remote() {
        let f = fixture();
        f.repository.set_online_status(false);
        f.repository
            .create(NewExpense::new("Refund", -5.0, "2026-02-01"))
            .await
            .unwrap();
        let valid = f.repository.create(coffee()).await.unwrap();

        f.repository.set_online_status(true);
        let report = f.repository.process_sync_queue().await;

        assert_eq!(report.dropped, 1);
        assert_eq!(report.synced, 1);
        assert_eq!(
            f.remote.calls().await,
            vec![RemoteCall::Create(valid.id.clone())]
        );
        assert!(f.repository.queue().is_empty().await);
    }

    #[tokio::test]
    async fn drain_keeps_transient_failures() {
        let f = fixture();
        f.repository.set_online_status(false);
        let first = f.repository.create(coffee()).await.unwrap();
        let second = f
            .repository
            .create(NewExpense::new("Lunch", 12.0, "2026-02-02"))
            .await
            .unwrap();

        f.repository.set_online_status(true);
        f.remote.fail_next(1);
        let report = f.repository.process_sync_queue().await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.synced, 1);
        assert_eq!(report.remaining, 1);
        assert_eq!(
            f.repository.queue().get_queue().await,
            vec![SyncEntry::create(first.clone())]
        );
        assert!(f.remote.get(&second.id).await.is_some());

        let report = f.repository.process_sync_queue().await;
        assert_eq!(report.synced, 1);
        assert!(f.remote.get(&first.id).await.is_some());
    }

    /// Remote that answers every call with 401, like one holding an expired token.
    struct UnauthorizedRemote;

    fn unauthorized() -> RemoteError {
        RemoteError::Rejected {
            status: 401,
            message: "token expired".into(),
        }
    }

    #[async_trait::async_trait]
    impl RemoteStore for UnauthorizedRemote {
        async fn list(&self) -> std::result::Result<Vec<Expense>, RemoteError> {
            Err(unauthorized())
        }

        async fn replace_all(&self, _: &[Expense]) -> std::result::Result<(), RemoteError> {
            Err(unauthorized())
        }

        async fn create(&self, _: &Expense) -> std::result::Result<(), RemoteError> {
            Err(unauthorized())
        }

        async fn update(&self, _: &Expense) -> std::result::Result<(), RemoteError> {
            Err(unauthorized())
        }

        async fn remove(&self, _: &str) -> std::result::Result<(), RemoteError> {
            Err(unauthorized())
        }
    }

    fn unauthorized_repository(start_online: bool) -> HybridRepository {
        HybridRepository::new(
            Arc::new(MemoryKeyValueStore::new()),
            Some(Arc::new(UnauthorizedRemote) as Arc<dyn RemoteStore>),
            RepositoryOptions {
                start_online,
                ..RepositoryOptions::default()
            },
        )
    }

    #[tokio::test]
    async fn unauthorized_drain_keeps_entry_queued() {
        let repository = unauthorized_repository(false);
        let created = repository.create(coffee()).await.unwrap();

        repository.set_online_status(true);
        let report = repository.process_sync_queue().await;

        assert_eq!(
            report,
            DrainReport {
                synced: 0,
                dropped: 0,
                failed: 1,
                remaining: 1
            }
        );
        assert_eq!(
            repository.queue().get_queue().await,
            vec![SyncEntry::create(created.clone())]
        );
        assert_eq!(repository.list().await, vec![created]);
    }

    #[tokio::test]
    async fn unauthorized_direct_write_is_queued() {
        let repository = unauthorized_repository(true);

        let created = repository.create(coffee()).await.unwrap();

        assert_eq!(
            repository.queue().get_queue().await,
            vec![SyncEntry::create(created.clone())]
        );
        assert_eq!(repository.get(&created.id).await, Some(created));
    }

    #[tokio::test]
    async fn list_prefers_remote_except_pending() {
        let f = fixture();
        f.remote
            .seed([
                Expense::new("1", "Groceries", 100.0, "2026-01-01"),
                Expense::new("2", "Rent", 1000.0, "2026-01-02"),
            ])
            .await;

        f.repository.set_online_status(false);
        f.repository
            .records()
            .create(&Expense::new("2", "Rent", 1000.0, "2026-01-02"))
            .await
            .unwrap();
        f.repository
            .update(Expense::new("2", "Rent (edited)", 1100.0, "2026-01-05"))
            .await
            .unwrap();
        f.repository.set_online_status(true);

        let listed = f.repository.list().await;
        let ids: Vec<_> = listed.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(listed[0].title, "Rent (edited)");

        // Persisted for the next offline read.
        assert_eq!(f.repository.records().list().await, listed);
    }

    #[tokio::test]
    async fn list_falls_back_to_local_on_remote_failure() {
        let f = fixture();
        let created = f.repository.create(coffee()).await.unwrap();
        f.remote.set_online(false);

        assert_eq!(f.repository.list().await, vec![created]);
    }

    #[tokio::test]
    async fn slow_remote_times_out_and_queues() {
        let f = fixture_with(RepositoryOptions {
            remote_timeout: Duration::from_millis(20),
            ..RepositoryOptions::default()
        });
        f.remote.set_latency(Some(Duration::from_millis(200))).await;

        let created = f.repository.create(coffee()).await.unwrap();

        assert_eq!(
            f.repository.queue().get_queue().await,
            vec![SyncEntry::create(created)]
        );
    }

    #[tokio::test]
    async fn replace_all_failure_is_not_queued() {
        let f = fixture();
        f.remote.set_online(false);

        f.repository
            .replace_all(vec![Expense::new("1", "Groceries", 100.0, "2026-01-01")])
            .await
            .unwrap();

        assert_eq!(f.repository.records().list().await.len(), 1);
        assert!(f.repository.queue().is_empty().await);
    }

    #[tokio::test]
    async fn replace_all_with_remote_down_keeps_seed_after_recovery() {
        let f = fixture();
        let seed = vec![Expense::new("1", "Groceries", 100.0, "2026-01-01")];
        f.remote.set_online(false);
        f.repository.replace_all(seed.clone()).await.unwrap();

        f.remote.set_online(true);
        let listed = f.repository.list().await;

        assert_eq!(listed, seed);
        assert_eq!(f.repository.records().list().await, seed);
    }

    #[tokio::test]
    async fn bootstrap_seeds_only_when_empty() {
        let f = fixture();
        let seed = vec![Expense::new("1", "Groceries", 100.0, "2026-01-01")];

        let listed = f.repository.bootstrap(seed.clone()).await.unwrap();
        assert_eq!(listed, seed);
        assert_eq!(f.remote.get("1").await, Some(seed[0].clone()));

        let other = vec![Expense::new("9", "Other", 1.0, "2026-01-09")];
        let listed = f.repository.bootstrap(other).await.unwrap();
        assert_eq!(listed, seed);
    }

    #[tokio::test]
    async fn bootstrap_refuses_unreadable_store() {
        let f = fixture();
        f.kv.set_failing(true);

        let result = f.repository.bootstrap(Vec::new()).await;
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn overlapping_refresh_is_skipped() {
        let f = Arc::new(fixture());
        f.remote.set_latency(Some(Duration::from_millis(100))).await;

        let background = {
            let f = f.clone();
            tokio::spawn(async move { f.repository.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(f.repository.is_syncing());
        assert_eq!(f.repository.refresh().await, None);
        assert!(background.await.unwrap().is_some());
        assert!(!f.repository.is_syncing());
    }

    #[tokio::test]
    async fn local_only_queues_everything() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let repository = HybridRepository::local_only(kv);

        let created = repository.create(coffee()).await.unwrap();

        assert!(!repository.has_remote());
        assert_eq!(repository.list().await, vec![created]);
        assert_eq!(repository.queue().len().await, 1);
        assert_eq!(repository.process_sync_queue().await.remaining, 1);
    }

    #[tokio::test]
    async fn generated_ids_are_unique() {
        let f = fixture();
        let mut ids = BTreeSet::new();
        for _ in 0..50 {
            ids.insert(f.repository.create(coffee()).await.unwrap().id);
        }
        assert_eq!(ids.len(), 50);
    }
}
