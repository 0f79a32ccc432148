use tokio::fs;
use std::path::PathBuf;
use tracing::debug;
use crate::storage::{StorageEngine, StoredObject, ObjectMetadata, is_valid_key};

/// Objects live directly under `root`; metadata sidecars under `root/.meta`.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(".meta").join(format!("{}.json", key))
    }
}

#[async_trait::async_trait]
impl StorageEngine for LocalStorage {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        meta: &ObjectMetadata,
    ) -> anyhow::Result<()> {
        if !is_valid_key(key) {
            anyhow::bail!("invalid object name {:?}", key);
        }

        fs::create_dir_all(self.root.join(".meta")).await?;
        fs::write(self.data_path(key), data).await?;
        fs::write(
            self.meta_path(key),
            serde_json::to_vec_pretty(meta)?,
        ).await?;
        debug!("Stored {} ({} bytes)", key, data.len());
        Ok(())
    }

    async fn get(
        &self,
        key: &str,
    ) -> anyhow::Result<Option<StoredObject>> {
        if !is_valid_key(key) {
            return Ok(None);
        }

        let data = match fs::read(self.data_path(key)).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let metadata = match fs::read(self.meta_path(key)).await {
            Ok(raw) => Some(serde_json::from_slice(&raw)?),
            Err(_) => None,
        };

        Ok(Some(StoredObject {
            data,
            metadata,
        }))
    }
}
