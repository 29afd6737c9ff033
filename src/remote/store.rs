//! Object storage backends for the summaries file

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::StoreError;

/// Minimal get/put object storage
pub trait ObjectStore: Send + Sync {
    /// Read an object as text; a missing object reads as an empty string
    fn get(&self, bucket: &str, key: &str) -> Result<String, StoreError>;

    /// Create or overwrite an object
    fn put(&self, bucket: &str, key: &str, content: &str) -> Result<(), StoreError>;
}

/// In-process store, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<FxHashMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> std::sync::MutexGuard<'_, FxHashMap<(String, String), String>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, bucket: &str, key: &str) -> Result<String, StoreError> {
        Ok(self
            .objects()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn put(&self, bucket: &str, key: &str, content: &str) -> Result<(), StoreError> {
        self.objects()
            .insert((bucket.to_string(), key.to_string()), content.to_string());
        Ok(())
    }
}

/// Filesystem store: each bucket is a directory under `root`
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        ensure_single_component(bucket)?;
        ensure_single_component(key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

fn ensure_single_component(name: &str) -> Result<(), StoreError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StoreError::InvalidLocation(name.to_string())),
    }
}

impl ObjectStore for DirectoryStore {
    fn get(&self, bucket: &str, key: &str) -> Result<String, StoreError> {
        let path = self.object_path(bucket, key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "object not found, reading as empty");
                return Ok(String::new());
            }
            Err(err) => return Err(err.into()),
        };

        String::from_utf8(bytes).map_err(|_| StoreError::NotText {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    fn put(&self, bucket: &str, key: &str, content: &str) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        fs::create_dir_all(self.root.join(bucket))?;
        fs::write(&path, content)?;
        debug!(path = %path.display(), bytes = content.len(), "object written");
        Ok(())
    }
}
