//! In-memory key store

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use super::{KeyRecord, KeyRecordStore};

/// HashMap-backed store with read/write counters
#[derive(Debug)]
pub struct InMemoryKeyRecordStore {
    records: RwLock<HashMap<(u64, String), KeyRecord>>,
    atomic_upsert: bool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryKeyRecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            atomic_upsert: true,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// A store that reports non-atomic upserts, for exercising the
    /// manager's keyed locking.
    pub fn without_atomic_upsert() -> Self {
        Self {
            atomic_upsert: false,
            ..Self::new()
        }
    }

    /// Number of `exists` and `get` calls
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `upsert` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Overwrite a stored record without touching the counters
    pub async fn insert_raw(&self, record: KeyRecord) {
        let key = (record.user_id, record.network.clone());
        self.records.write().await.insert(key, record);
    }
}

impl Default for InMemoryKeyRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyRecordStore for InMemoryKeyRecordStore {
    async fn exists(&self, user_id: u64, network: &str) -> Result<bool> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().await;
        Ok(records.contains_key(&(user_id, network.to_string())))
    }

    async fn get(&self, user_id: u64, network: &str) -> Result<KeyRecord> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().await;
        records
            .get(&(user_id, network.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                user_id,
                network: network.to_string(),
            })
    }

    async fn upsert(&self, record: &KeyRecord) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let key = (record.user_id, record.network.clone());
        self.records.write().await.insert(key, record.clone());
        Ok(())
    }

    async fn ensure_unique_index(&self) -> Result<()> {
        // HashMap keys are unique already
        Ok(())
    }

    fn supports_atomic_upsert(&self) -> bool {
        self.atomic_upsert
    }
}
