//! Persistence of issued keys
//!
//! The manager only talks to [`KeyRecordStore`]; backing engines are
//! swappable. Records are keyed by `(user_id, network)`.

mod memory;

pub use memory::InMemoryKeyRecordStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A persisted key. The private key is only ever stored encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub user_id: u64,
    pub network: String,
    pub address: String,
    pub public_key: String,
    pub encrypted_private_key: String,
}

/// Storage contract consumed by the key manager
#[async_trait]
pub trait KeyRecordStore: Send + Sync {
    async fn exists(&self, user_id: u64, network: &str) -> Result<bool>;

    /// Fails with `Error::NotFound` when no record exists
    async fn get(&self, user_id: u64, network: &str) -> Result<KeyRecord>;

    /// Insert or replace by `(user_id, network)`. A conflicting row is not an error.
    async fn upsert(&self, record: &KeyRecord) -> Result<()>;

    /// One-time setup enforcing `(user_id, network)` uniqueness
    async fn ensure_unique_index(&self) -> Result<()>;

    /// Whether `upsert` is atomic. When false the manager serializes
    /// generation per key itself.
    fn supports_atomic_upsert(&self) -> bool {
        true
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
