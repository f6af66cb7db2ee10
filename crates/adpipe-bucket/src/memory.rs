use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};

use crate::{BucketError, BucketStore, ObjectSummary};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Bytes,
    last_modified: DateTime<Utc>,
}

/// In-process store. Every write gets a strictly later timestamp than the one before it,
/// so "latest object" selection is deterministic even for back-to-back writes.
#[derive(Debug, Default)]
pub struct MemoryBucketStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an object with an explicit modification time.
    pub fn insert_at(&self, key: &str, bytes: Bytes, last_modified: DateTime<Utc>) {
        let mut objects = self.lock();
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                last_modified,
            },
        );
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BucketStore for MemoryBucketStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BucketError> {
        let mut objects = self.lock();
        let newest = objects.values().map(|object| object.last_modified).max();
        let now = Utc::now();
        let last_modified = match newest {
            Some(previous) if previous >= now => previous + Duration::milliseconds(1),
            _ => now,
        };
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                last_modified,
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError> {
        self.lock()
            .get(key)
            .map(|object| object.bytes.clone())
            .ok_or_else(|| BucketError::NotFound(key.to_string()))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, BucketError> {
        Ok(self
            .lock()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                last_modified: object.last_modified,
            })
            .collect())
    }
}
