use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;

use crate::{BucketError, BucketStore, ObjectSummary};

/// Stores objects as files under a root directory; keys map to relative paths.
#[derive(Debug, Clone)]
pub struct LocalBucketStore {
    root: PathBuf,
}

impl LocalBucketStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BucketError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(BucketError::Configuration(format!(
                "invalid object key '{key}'"
            )));
        }
        Ok(self.root.join(relative))
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl BucketStore for LocalBucketStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BucketError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &bytes).await?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(contents) => Ok(Bytes::from(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(BucketError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, BucketError> {
        let mut summaries = Vec::new();
        if !fs::try_exists(&self.root).await? {
            return Ok(summaries);
        }

        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                let path = entry.path();
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Some(key) = self.key_for(&path) else {
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }

                let last_modified: DateTime<Utc> = metadata.modified()?.into();
                summaries.push(ObjectSummary { key, last_modified });
            }
        }

        summaries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(summaries)
    }
}
