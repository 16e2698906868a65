//! Interleaved handlers must not lose each other's updates: every mutation
//! holds the per-record-kind lock across its whole load-mutate-save span.

use std::sync::Arc;

use tempfile::TempDir;

use quartermaster_core::errors::DomainError;
use quartermaster_store::{FsBackend, RecordStore, StoreError};

#[derive(Debug, thiserror::Error)]
enum FlowError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_credits_lose_no_updates() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(RecordStore::new(Arc::new(FsBackend::new(dir.path()))));

    let mut tasks = Vec::new();
    for index in 0..20u64 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store
                .with_ledger(|ledger| {
                    ledger
                        .credit(format!("U{}", index % 5), format!("user-{index}"), 100, None)
                        .map_err(FlowError::from)
                })
                .await
        }));
    }
    for task in tasks {
        task.await.expect("join").expect("credit");
    }

    let ledger = store.load_ledger().await.expect("load");
    assert_eq!(ledger.total, 2_000);
    assert_eq!(ledger.transactions.len(), 20);
    assert_eq!(ledger.donors.values().sum::<u64>(), 2_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_on_one_event_all_land() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(RecordStore::new(Arc::new(FsBackend::new(dir.path()))));

    let event = store
        .with_events(|roster| {
            roster.create("Mining run", "Friday", "Meet at pad 3", true).map_err(FlowError::from)
        })
        .await
        .expect("create");

    let mut tasks = Vec::new();
    for index in 0..16u64 {
        let store = store.clone();
        let event_id = event.id;
        tasks.push(tokio::spawn(async move {
            store
                .with_events(|roster| {
                    roster.join(event_id, &format!("U{index}")).map_err(FlowError::from)
                })
                .await
        }));
    }
    for task in tasks {
        task.await.expect("join task").expect("rsvp");
    }

    let roster = store.load_events().await.expect("load");
    assert_eq!(roster.events[0].participants.len(), 16);
}

#[tokio::test]
async fn debit_and_credit_interleaving_preserves_the_balance_identity() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(RecordStore::new(Arc::new(FsBackend::new(dir.path()))));

    store
        .with_ledger(|ledger| ledger.credit("U0", "seed", 10_000, None).map_err(FlowError::from))
        .await
        .expect("seed");

    let credit_store = store.clone();
    let credits = tokio::spawn(async move {
        for _ in 0..10 {
            credit_store
                .with_ledger(|ledger| {
                    ledger.credit("U1", "ada", 50, None).map_err(FlowError::from)
                })
                .await
                .expect("credit");
        }
    });
    let debit_store = store.clone();
    let debits = tokio::spawn(async move {
        for _ in 0..10 {
            debit_store
                .with_ledger(|ledger| {
                    ledger.debit("U9", "officer", 30, true).map_err(FlowError::from)
                })
                .await
                .expect("debit");
        }
    });

    credits.await.expect("credits task");
    debits.await.expect("debits task");

    let ledger = store.load_ledger().await.expect("load");
    assert_eq!(ledger.total, 10_000 + 10 * 50 - 10 * 30);
    assert_eq!(ledger.transactions.len(), 21);
}
