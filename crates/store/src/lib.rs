//! Persistence for the quartermaster record documents.
//!
//! Two flat JSON documents (the bank ledger and the event roster) plus a
//! handful of scalar marker slots, behind a pluggable [`StorageBackend`].
//! [`RecordStore::with_ledger`] / [`RecordStore::with_events`] serialize
//! load-mutate-save per record kind so concurrent handlers cannot overwrite
//! each other's updates.

pub mod backend;
pub mod documents;
pub mod markers;

pub use backend::{FsBackend, MemoryBackend, StorageBackend, StoreError};
pub use documents::{RecordStore, EVENTS_DOCUMENT, LEDGER_DOCUMENT};
pub use markers::{MarkerSlot, MarkerStore};
