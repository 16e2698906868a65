use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::warn;

use quartermaster_core::ledger::Ledger;
use quartermaster_core::roster::EventRoster;

use crate::backend::{StorageBackend, StoreError};

pub const LEDGER_DOCUMENT: &str = "bank.json";
pub const EVENTS_DOCUMENT: &str = "events.json";

/// Typed access to the two record documents. Loads never fail the caller:
/// a missing or unparsable document is replaced by a persisted default.
/// Mutations go through `with_ledger`/`with_events`, which hold a
/// per-record-kind lock across the whole load-mutate-save sequence so
/// interleaved handlers cannot lose each other's updates.
pub struct RecordStore {
    backend: Arc<dyn StorageBackend>,
    ledger_lock: Mutex<()>,
    events_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend, ledger_lock: Mutex::new(()), events_lock: Mutex::new(()) }
    }

    pub async fn load_ledger(&self) -> Result<Ledger, StoreError> {
        self.load_or_default(LEDGER_DOCUMENT).await
    }

    pub async fn save_ledger(&self, ledger: &Ledger) -> Result<(), StoreError> {
        self.save(LEDGER_DOCUMENT, ledger).await
    }

    pub async fn load_events(&self) -> Result<EventRoster, StoreError> {
        self.load_or_default(EVENTS_DOCUMENT).await
    }

    pub async fn save_events(&self, roster: &EventRoster) -> Result<(), StoreError> {
        self.save(EVENTS_DOCUMENT, roster).await
    }

    /// Run a ledger mutation under the ledger lock. An `Err` from the
    /// closure skips the save, leaving the persisted document untouched.
    pub async fn with_ledger<T, E, F>(&self, mutate: F) -> Result<T, E>
    where
        F: FnOnce(&mut Ledger) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.ledger_lock.lock().await;
        let mut ledger = self.load_ledger().await?;
        let value = mutate(&mut ledger)?;
        self.save_ledger(&ledger).await?;
        Ok(value)
    }

    /// Run an events mutation under the events lock; same contract as
    /// `with_ledger`.
    pub async fn with_events<T, E, F>(&self, mutate: F) -> Result<T, E>
    where
        F: FnOnce(&mut EventRoster) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.events_lock.lock().await;
        let mut roster = self.load_events().await?;
        let value = mutate(&mut roster)?;
        self.save_events(&roster).await?;
        Ok(value)
    }

    async fn load_or_default<T>(&self, name: &str) -> Result<T, StoreError>
    where
        T: Default + Serialize + DeserializeOwned,
    {
        let document = match self.backend.read(name).await? {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(document) => return Ok(document),
                Err(error) => {
                    // Availability over durability: a corrupt document is
                    // reset rather than blocking every future operation.
                    warn!(
                        event_name = "store.document.corrupt_reset",
                        document = name,
                        error = %error,
                        "backing document was unparsable; resetting to default"
                    );
                    T::default()
                }
            },
            None => T::default(),
        };

        self.save(name, &document).await?;
        Ok(document)
    }

    async fn save<T: Serialize>(&self, name: &str, document: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|source| StoreError::Encode { name: name.to_owned(), source })?;
        self.backend.write(name, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quartermaster_core::errors::DomainError;
    use quartermaster_core::ledger::Ledger;

    use super::{RecordStore, EVENTS_DOCUMENT, LEDGER_DOCUMENT};
    use crate::backend::{MemoryBackend, StorageBackend, StoreError};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error(transparent)]
        Domain(#[from] DomainError),
        #[error(transparent)]
        Store(#[from] StoreError),
    }

    fn store() -> (Arc<MemoryBackend>, RecordStore) {
        let backend = Arc::new(MemoryBackend::default());
        (backend.clone(), RecordStore::new(backend))
    }

    #[tokio::test]
    async fn missing_ledger_loads_as_persisted_default() {
        let (backend, store) = store();

        let ledger = store.load_ledger().await.expect("load");

        assert_eq!(ledger, Ledger::default());
        let persisted = backend.read(LEDGER_DOCUMENT).await.expect("read").expect("persisted");
        let decoded: Ledger = serde_json::from_slice(&persisted).expect("decode");
        assert_eq!(decoded, Ledger::default());
    }

    #[tokio::test]
    async fn corrupt_ledger_resets_to_default() {
        let (backend, store) = store();
        backend.write(LEDGER_DOCUMENT, b"{not json").await.expect("write");

        let ledger = store.load_ledger().await.expect("load");

        assert_eq!(ledger, Ledger::default());
        let persisted = backend.read(LEDGER_DOCUMENT).await.expect("read").expect("persisted");
        assert!(serde_json::from_slice::<Ledger>(&persisted).is_ok());
    }

    #[tokio::test]
    async fn load_then_save_is_an_observable_noop() {
        let (backend, store) = store();
        store
            .with_ledger(|ledger| ledger.credit("U1", "ada", 5_000, None).map_err(TestError::from))
            .await
            .expect("credit");
        let before = backend.read(LEDGER_DOCUMENT).await.expect("read").expect("present");

        let loaded = store.load_ledger().await.expect("load");
        store.save_ledger(&loaded).await.expect("save");

        let after = backend.read(LEDGER_DOCUMENT).await.expect("read").expect("present");
        let decoded_before: Ledger = serde_json::from_slice(&before).expect("decode");
        let decoded_after: Ledger = serde_json::from_slice(&after).expect("decode");
        assert_eq!(decoded_before, decoded_after);
    }

    #[tokio::test]
    async fn failed_mutation_skips_the_save() {
        let (backend, store) = store();
        store
            .with_ledger(|ledger| ledger.credit("U1", "ada", 5_000, None).map_err(TestError::from))
            .await
            .expect("credit");

        let result = store
            .with_ledger(|ledger| {
                ledger.debit("U9", "officer", 6_000, true).map_err(TestError::from)
            })
            .await;

        assert!(matches!(result, Err(TestError::Domain(DomainError::InsufficientFunds { .. }))));
        let persisted = backend.read(LEDGER_DOCUMENT).await.expect("read").expect("present");
        let ledger: Ledger = serde_json::from_slice(&persisted).expect("decode");
        assert_eq!(ledger.total, 5_000);
        assert_eq!(ledger.transactions.len(), 1);
    }

    #[tokio::test]
    async fn events_document_defaults_and_round_trips() {
        let (backend, store) = store();

        let roster = store.load_events().await.expect("load");
        assert!(roster.events.is_empty());

        store
            .with_events(|roster| {
                roster.create("Mining run", "Friday", "Meet at pad 3", true).map_err(TestError::from)
            })
            .await
            .expect("create");

        let persisted = backend.read(EVENTS_DOCUMENT).await.expect("read").expect("present");
        let decoded: quartermaster_core::roster::EventRoster =
            serde_json::from_slice(&persisted).expect("decode");
        assert_eq!(decoded.events.len(), 1);
        assert_eq!(decoded.next_event_id, 1);
    }
}
