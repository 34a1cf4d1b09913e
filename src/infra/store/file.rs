use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::application::store::{CollectionStore, StoreError};

/// One `<name>.json` array per collection under a directory.
///
/// Saves write a sibling temporary file and rename it over the target, so a
/// reader sees either the previous array or the new one.
#[derive(Debug, Clone)]
pub struct FileCollectionStore {
    root: PathBuf,
}

impl FileCollectionStore {
    /// Creates `root` if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

#[async_trait]
impl CollectionStore for FileCollectionStore {
    async fn load(&self, name: &str) -> Result<Option<Vec<Value>>, StoreError> {
        let bytes = match tokio::fs::read(self.path_for(name)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io(name, err)),
        };
        let items = serde_json::from_slice(&bytes).map_err(|err| StoreError::serialization(name, err))?;
        Ok(Some(items))
    }

    async fn save(&self, name: &str, items: Vec<Value>) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec_pretty(&items).map_err(|err| StoreError::serialization(name, err))?;
        let root = self.root.clone();
        let target = self.path_for(name);

        tokio::task::spawn_blocking(move || -> Result<(), std::io::Error> {
            let mut staged = NamedTempFile::new_in(&root)?;
            staged.write_all(&bytes)?;
            staged.as_file().sync_all()?;
            staged.persist(&target).map_err(|err| err.error)?;
            Ok(())
        })
        .await
        .map_err(|err| StoreError::io(name, std::io::Error::other(err)))?
        .map_err(|err| StoreError::io(name, err))?;

        debug!(
            target = "timberline::store",
            collection = name,
            documents = items.len(),
            "collection written"
        );
        Ok(())
    }
}
