use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::storefront::StoreSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable home for store snapshots
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// `None` when nothing has been saved yet
    async fn load(&self) -> Result<Option<StoreSnapshot>, PersistenceError>;

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), PersistenceError>;
}

/// Snapshot stored as pretty JSON on local disk.
///
/// Saves are serialized; each writes its own temp file before the rename.
pub struct JsonFileRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotRepository for JsonFileRepository {
    async fn load(&self) -> Result<Option<StoreSnapshot>, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = serde_json::from_slice(&bytes)?;
        info!("Loaded snapshot from {}", self.path.display());
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write then rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        info!("Saved snapshot to {}", self.path.display());
        Ok(())
    }
}

/// Keeps the serialized snapshot in memory; used when no path is configured
#[derive(Default)]
pub struct MemoryRepository {
    saved: Mutex<Option<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotRepository for MemoryRepository {
    async fn load(&self) -> Result<Option<StoreSnapshot>, PersistenceError> {
        let saved = self.saved.lock().await;
        match saved.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(snapshot)?;
        *self.saved.lock().await = Some(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront::{Storefront, StorefrontSettings};
    use pawmart_catalog::Catalog;

    #[tokio::test]
    async fn test_file_repository_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("nested").join("store.json"));
        assert!(repo.load().await.unwrap().is_none());

        let mut store = Storefront::new(Catalog::mock(), StorefrontSettings::default());
        let product = store.catalog().products[0].id;
        store.add_to_cart("guest-1", &product, 2).unwrap();

        repo.save(&store.snapshot()).await.unwrap();
        let loaded = repo.load().await.unwrap().unwrap();

        let mut restored = Storefront::new(Catalog::mock(), StorefrontSettings::default());
        restored.restore(loaded);
        assert_eq!(restored.cart("guest-1").cart.item_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_saves_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let repo = std::sync::Arc::new(JsonFileRepository::new(dir.path().join("store.json")));
        let store = Storefront::new(Catalog::mock(), StorefrontSettings::default());
        let snapshot = store.snapshot();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let repo = repo.clone();
            let snapshot = snapshot.clone();
            tasks.spawn(async move { repo.save(&snapshot).await });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        assert!(repo.load().await.unwrap().is_some());
        // No temp files left behind
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name());
        }
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
    }

    #[tokio::test]
    async fn test_file_repository_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let repo = JsonFileRepository::new(&path);
        assert!(matches!(repo.load().await, Err(PersistenceError::Format(_))));
    }

    #[tokio::test]
    async fn test_memory_repository() {
        let repo = MemoryRepository::new();
        assert!(repo.load().await.unwrap().is_none());

        let store = Storefront::new(Catalog::mock(), StorefrontSettings::default());
        repo.save(&store.snapshot()).await.unwrap();
        let loaded = repo.load().await.unwrap().unwrap();
        assert_eq!(loaded.users.len(), 3);
    }
}
