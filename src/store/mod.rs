//! Persistent clip store
//!
//! The store keeps the whole clip list under a single key of a key-value
//! backend. Reads and writes always move the full list; there are no partial
//! updates.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::clip::{ClipId, ClipRecord};

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Key the clip list is stored under
pub const CLIPS_KEY: &str = "clips";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored value could not be encoded or decoded
    #[error("Failed to serialize clips: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking storage task failed
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Structured key-value storage provided by the host
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove `key` entirely
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Where a re-saved clip lands when it matches an existing record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertPolicy {
    /// Replace the record where it is
    #[default]
    KeepPosition,
    /// Replace the record and move it to the front
    MoveToFront,
}

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new record was added at the front
    Inserted { id: ClipId },
    /// An existing `(text, domain)` record was replaced; `index` is its final position
    Updated { id: ClipId, index: usize },
}

impl UpsertOutcome {
    pub fn id(&self) -> ClipId {
        match self {
            UpsertOutcome::Inserted { id } | UpsertOutcome::Updated { id, .. } => *id,
        }
    }
}

/// Apply the de-duplicating upsert to an in-memory list.
///
/// The first record with the same `(text, domain)` is replaced and keeps its
/// id. Otherwise the record is inserted at the front.
pub fn apply_upsert(
    clips: &mut Vec<ClipRecord>,
    mut record: ClipRecord,
    policy: UpsertPolicy,
) -> UpsertOutcome {
    match clips.iter().position(|existing| existing.same_key(&record)) {
        Some(index) => {
            record.id = clips[index].id;
            let id = record.id;
            match policy {
                UpsertPolicy::KeepPosition => {
                    clips[index] = record;
                    UpsertOutcome::Updated { id, index }
                }
                UpsertPolicy::MoveToFront => {
                    clips.remove(index);
                    clips.insert(0, record);
                    UpsertOutcome::Updated { id, index: 0 }
                }
            }
        }
        None => {
            let id = record.id;
            clips.insert(0, record);
            UpsertOutcome::Inserted { id }
        }
    }
}

/// Access layer over the persisted clip list
pub struct ClipStore<S> {
    storage: S,
    policy: UpsertPolicy,
    // Serializes read-modify-write cycles issued through this handle
    write_lock: Mutex<()>,
}

impl<S: KeyValueStorage> ClipStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            policy: UpsertPolicy::default(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_policy(mut self, policy: UpsertPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UpsertPolicy {
        self.policy
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the full clip list, empty if it was never written
    pub async fn load(&self) -> Result<Vec<ClipRecord>, StoreError> {
        match self.storage.get(CLIPS_KEY).await? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// Persist the full clip list
    pub async fn save(&self, clips: &[ClipRecord]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(clips).await
    }

    /// Insert a record, or replace the one with the same `(text, domain)`
    pub async fn upsert(&self, record: ClipRecord) -> Result<UpsertOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut clips = self.load().await?;
        let outcome = apply_upsert(&mut clips, record, self.policy);
        self.write(&clips).await?;

        debug!(
            "Upserted clip {:?} via {} ({} clips stored)",
            outcome,
            self.storage.name(),
            clips.len()
        );
        Ok(outcome)
    }

    /// Remove every clip
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.save(&[]).await
    }

    async fn write(&self, clips: &[ClipRecord]) -> Result<(), StoreError> {
        let value = serde_json::to_value(clips)?;
        self.storage.set(CLIPS_KEY, value).await
    }
}
