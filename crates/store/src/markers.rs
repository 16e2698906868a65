use std::sync::Arc;

use crate::backend::{StorageBackend, StoreError};

/// Single-value text slots persisted next to the record documents: the
/// standing-message reference per record kind, the role-picker message, and
/// the last announced version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerSlot {
    BankStatus,
    EventsStatus,
    RolePicker,
    LastVersion,
}

impl MarkerSlot {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::BankStatus => "bank_status_message.txt",
            Self::EventsStatus => "events_status_message.txt",
            Self::RolePicker => "role_picker_message.txt",
            Self::LastVersion => "last_version.txt",
        }
    }
}

pub struct MarkerStore {
    backend: Arc<dyn StorageBackend>,
}

impl MarkerStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// A missing slot (or one holding only whitespace or invalid UTF-8)
    /// reads as `None`.
    pub async fn get(&self, slot: MarkerSlot) -> Result<Option<String>, StoreError> {
        let Some(bytes) = self.backend.read(slot.file_name()).await? else {
            return Ok(None);
        };
        let value = String::from_utf8(bytes).unwrap_or_default();
        let trimmed = value.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
    }

    pub async fn set(&self, slot: MarkerSlot, value: &str) -> Result<(), StoreError> {
        self.backend.write(slot.file_name(), value.as_bytes()).await
    }
}
