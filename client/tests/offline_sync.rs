//! End-to-end behavior of the hybrid repository against in-memory and
//! file-backed stores.

use proptest::prelude::*;
use std::sync::Arc;
use tally_client::{
    FileKeyValueStore, HybridRepository, KeyValueStore, MemoryKeyValueStore, MemoryRemoteStore,
    RemoteCall, RemoteStore, RepositoryOptions,
};
use tally_engine::{Expense, NewExpense, SyncEntry, SyncEntryKind};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn repository_over(
    kv: Arc<dyn KeyValueStore>,
    remote: &Arc<MemoryRemoteStore>,
    online: bool,
) -> HybridRepository {
    HybridRepository::new(
        kv,
        Some(remote.clone() as Arc<dyn RemoteStore>),
        RepositoryOptions {
            start_online: online,
            ..RepositoryOptions::default()
        },
    )
}

fn setup(online: bool) -> (Arc<MemoryRemoteStore>, HybridRepository) {
    init_tracing();
    let remote = Arc::new(MemoryRemoteStore::new());
    let repository = repository_over(Arc::new(MemoryKeyValueStore::new()), &remote, online);
    (remote, repository)
}

#[tokio::test]
async fn scenario_offline_create() {
    let (_, repository) = setup(false);

    let coffee = repository
        .create(NewExpense::new("Coffee", 3.50, "2026-02-01"))
        .await
        .unwrap();

    assert_eq!(repository.records().list().await, vec![coffee.clone()]);

    let queue = repository.queue().get_queue().await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].kind(), SyncEntryKind::Create);
    assert!(repository.pending_sync_ids().await.contains(&coffee.id));
}

#[tokio::test]
async fn scenario_coming_online_drains() {
    let (remote, repository) = setup(false);
    let e1 = repository
        .create(NewExpense::new("Coffee", 3.50, "2026-02-01"))
        .await
        .unwrap();

    repository.set_online_status(true);
    let report = repository.process_sync_queue().await;

    assert_eq!(report.synced, 1);
    assert_eq!(remote.get(&e1.id).await, Some(e1.clone()));
    assert!(repository.queue().is_empty().await);
    assert!(!repository.pending_sync_ids().await.contains(&e1.id));
}

#[tokio::test]
async fn scenario_pending_local_edit_survives_merge() {
    let (remote, repository) = setup(false);
    remote
        .seed([
            Expense::new("1", "Groceries", 100.0, "2026-01-01"),
            Expense::new("2", "Rent", 1000.0, "2026-01-02"),
        ])
        .await;

    let l1 = Expense::new("2", "Rent (edited)", 1000.0, "2026-01-05");
    repository.records().replace_all(&[l1.clone()]).await.unwrap();
    repository
        .queue()
        .add_to_queue(SyncEntry::update(l1.clone()))
        .await
        .unwrap();

    repository.set_online_status(true);
    let listed = repository.list().await;

    assert_eq!(
        listed,
        vec![l1, Expense::new("1", "Groceries", 100.0, "2026-01-01")]
    );
}

#[tokio::test]
async fn remote_wins_for_records_without_pending_writes() {
    let (remote, repository) = setup(true);
    let stale = Expense::new("x", "Old title", 5.0, "2026-01-01");
    let fresh = Expense::new("x", "New title", 6.0, "2026-01-01");
    remote.seed([fresh.clone()]).await;
    repository.records().replace_all(&[stale]).await.unwrap();

    assert_eq!(repository.list().await, vec![fresh]);
}

#[tokio::test]
async fn drain_twice_is_drain_once() {
    let (remote, repository) = setup(false);
    for title in ["a", "b"] {
        repository
            .create(NewExpense::new(title, 1.0, "2026-02-01"))
            .await
            .unwrap();
    }

    repository.set_online_status(true);
    let first = repository.process_sync_queue().await;
    let calls_after_first = remote.calls().await;
    let second = repository.process_sync_queue().await;

    assert_eq!(first.synced, 2);
    assert!(second.is_empty());
    assert_eq!(second.remaining, 0);
    assert_eq!(remote.calls().await, calls_after_first);
}

#[tokio::test]
async fn drain_preserves_enqueue_order() {
    let (remote, repository) = setup(true);

    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        remote.fail_next(1);
        let created = repository
            .create(NewExpense::new(title, 1.0, "2026-02-01"))
            .await
            .unwrap();
        ids.push(created.id);
    }
    assert_eq!(repository.queue().len().await, 3);

    remote.clear_calls().await;
    let report = repository.process_sync_queue().await;

    assert_eq!(report.synced, 3);
    assert_eq!(
        remote.calls().await,
        ids.into_iter().map(RemoteCall::Create).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn malformed_entry_is_skipped_without_blocking() {
    let (remote, repository) = setup(false);
    let bad = repository
        .create(NewExpense::new("Refund", -5.0, "2026-02-01"))
        .await
        .unwrap();
    let good = repository
        .create(NewExpense::new("Coffee", 3.5, "2026-02-01"))
        .await
        .unwrap();

    repository.set_online_status(true);
    let report = repository.process_sync_queue().await;

    assert_eq!(report.dropped, 1);
    assert_eq!(report.synced, 1);
    assert!(repository.queue().is_empty().await);
    assert!(!remote
        .calls()
        .await
        .contains(&RemoteCall::Create(bad.id.clone())));
    assert!(remote.get(&good.id).await.is_some());
}

#[tokio::test]
async fn nan_amount_from_text_input_is_dropped_at_drain() {
    let (remote, repository) = setup(false);
    let amount = tally_engine::parse_amount_input("abc");
    repository
        .create(NewExpense::new("Typo", amount, "2026-02-01"))
        .await
        .unwrap();

    repository.set_online_status(true);
    let report = repository.process_sync_queue().await;

    assert_eq!(report.dropped, 1);
    assert!(remote.calls().await.is_empty());
}

#[tokio::test]
async fn create_then_update_reach_remote_in_order() {
    let (remote, repository) = setup(false);
    let created = repository
        .create(NewExpense::new("Rent", 1000.0, "2026-01-02").with_category("Housing"))
        .await
        .unwrap();
    let edited = Expense {
        amount: 1100.0,
        ..created.clone()
    };
    repository.update(edited.clone()).await.unwrap();

    repository.set_online_status(true);
    repository.process_sync_queue().await;

    assert_eq!(
        remote.calls().await,
        vec![
            RemoteCall::Create(created.id.clone()),
            RemoteCall::Update(created.id.clone())
        ]
    );
    assert_eq!(remote.get(&created.id).await, Some(edited));
}

#[tokio::test]
async fn queue_and_records_survive_restart() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(MemoryRemoteStore::new());

    let created = {
        let kv = Arc::new(FileKeyValueStore::open(dir.path()).await.unwrap());
        let repository = repository_over(kv, &remote, false);
        repository
            .create(NewExpense::new("Coffee", 3.5, "2026-02-01"))
            .await
            .unwrap()
    };

    let kv = Arc::new(FileKeyValueStore::open(dir.path()).await.unwrap());
    let repository = repository_over(kv, &remote, true);

    assert_eq!(repository.get(&created.id).await, Some(created.clone()));
    assert!(repository.pending_sync_ids().await.contains(&created.id));

    repository.process_sync_queue().await;
    assert_eq!(remote.get(&created.id).await, Some(created));
    assert!(repository.queue().is_empty().await);
}

#[tokio::test]
async fn reads_queue_written_by_older_clients() {
    init_tracing();
    let kv = Arc::new(MemoryKeyValueStore::new());
    kv.put_raw(
        tally_client::QUEUE_KEY,
        r#"[{"type":"create","expense":{"id":"1","title":"Groceries","amount":100,"date":"2026-01-01"}},{"type":"delete","id":"2"}]"#,
    )
    .await;
    let remote = Arc::new(MemoryRemoteStore::new());
    let repository = repository_over(kv, &remote, true);

    let report = repository.process_sync_queue().await;

    assert_eq!(report.synced, 2);
    assert_eq!(
        remote.calls().await,
        vec![
            RemoteCall::Create("1".into()),
            RemoteCall::Remove("2".into())
        ]
    );
}

#[derive(Debug, Clone)]
enum Mutation {
    Create(String, u32),
    Update(usize, u32),
    Remove(usize),
}

fn mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        ("[a-z]{1,8}", 0u32..10_000).prop_map(|(t, a)| Mutation::Create(t, a)),
        (0usize..8, 0u32..10_000).prop_map(|(i, a)| Mutation::Update(i, a)),
        (0usize..8).prop_map(Mutation::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Offline mutations leave the local store exactly where applying them
    /// to a plain list would.
    #[test]
    fn offline_mutations_match_in_memory_model(
        mutations in prop::collection::vec(mutation(), 0..20),
        remote_up in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let remote = Arc::new(MemoryRemoteStore::new());
            remote.set_online(remote_up);
            let repository =
                repository_over(Arc::new(MemoryKeyValueStore::new()), &remote, false);
            let mut model: Vec<Expense> = Vec::new();

            for m in mutations {
                match m {
                    Mutation::Create(title, cents) => {
                        let fields = NewExpense::new(title, f64::from(cents) / 100.0, "2026-02-01");
                        model.push(repository.create(fields).await.unwrap());
                    }
                    Mutation::Update(i, cents) if !model.is_empty() => {
                        let i = i % model.len();
                        model[i].amount = f64::from(cents) / 100.0;
                        repository.update(model[i].clone()).await.unwrap();
                    }
                    Mutation::Remove(i) if !model.is_empty() => {
                        let removed = model.remove(i % model.len());
                        repository.remove(&removed.id).await.unwrap();
                    }
                    _ => {}
                }
            }

            assert_eq!(repository.list().await, model);
            assert!(remote.calls().await.is_empty());
        });
    }
}
