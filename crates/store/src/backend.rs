use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage read failed for `{name}`: {source}")]
    Read { name: String, source: std::io::Error },
    #[error("storage write failed for `{name}`: {source}")]
    Write { name: String, source: std::io::Error },
    #[error("could not encode `{name}`: {source}")]
    Encode { name: String, source: serde_json::Error },
}

/// Byte-level persistence for named documents. Implementations must make a
/// `write` replace the previous content in one observable step.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Flat files under a data directory. Writes land in a sibling temp file
/// first and are moved into place, so readers never observe a partial write.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.path_for(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { name: name.to_owned(), source }),
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let write_failed =
            |source: std::io::Error| StoreError::Write { name: name.to_owned(), source };

        tokio::fs::create_dir_all(&self.root).await.map_err(write_failed)?;
        let final_path = self.path_for(name);
        let tmp_path = self.path_for(&format!("{name}.tmp"));
        tokio::fs::write(&tmp_path, bytes).await.map_err(write_failed)?;
        tokio::fs::rename(&tmp_path, &final_path).await.map_err(write_failed)?;
        Ok(())
    }
}

/// In-memory backend for tests and dry-run tooling.
#[derive(Default)]
pub struct MemoryBackend {
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.get(name).cloned())
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        documents.insert(name.to_owned(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{FsBackend, MemoryBackend, StorageBackend};

    #[tokio::test]
    async fn fs_backend_round_trips_and_reports_missing_files() {
        let dir = TempDir::new().expect("tempdir");
        let backend = FsBackend::new(dir.path());

        assert_eq!(backend.read("bank.json").await.expect("read"), None);

        backend.write("bank.json", b"{\"total\":1}").await.expect("write");
        let bytes = backend.read("bank.json").await.expect("read").expect("present");
        assert_eq!(bytes, b"{\"total\":1}");
    }

    #[tokio::test]
    async fn fs_backend_write_replaces_previous_content() {
        let dir = TempDir::new().expect("tempdir");
        let backend = FsBackend::new(dir.path());

        backend.write("doc.json", b"first").await.expect("write");
        backend.write("doc.json", b"second").await.expect("write");

        let bytes = backend.read("doc.json").await.expect("read").expect("present");
        assert_eq!(bytes, b"second");
        assert!(!dir.path().join("doc.json.tmp").exists());
    }

    #[tokio::test]
    async fn memory_backend_round_trips() {
        let backend = MemoryBackend::default();

        assert_eq!(backend.read("events.json").await.expect("read"), None);
        backend.write("events.json", b"[]").await.expect("write");
        assert_eq!(backend.read("events.json").await.expect("read"), Some(b"[]".to_vec()));
    }
}
