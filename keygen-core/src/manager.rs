//! Get-or-create key resolution

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::KeygenConfig;
use crate::crypto::encryption::EncryptionCodec;
use crate::crypto::keys::{DerivedKeyMaterial, GeneratorRegistry, NetworkKeyGenerator};
use crate::crypto::seed::SeedDeriver;
use crate::error::Result;
use crate::store::{KeyRecord, KeyRecordStore};

/// Plaintext keys handed back to callers
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTriple {
    pub address: String,
    pub public_key: String,
    pub private_key: String,
}

impl From<&DerivedKeyMaterial> for KeyTriple {
    fn from(material: &DerivedKeyMaterial) -> Self {
        Self {
            address: material.address().to_string(),
            public_key: material.public_key().to_string(),
            private_key: material.private_key().to_string(),
        }
    }
}

impl fmt::Debug for KeyTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyTriple")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

type LockKey = (u64, String);
type GenerationLocks = StdMutex<HashMap<LockKey, Arc<Mutex<()>>>>;

/// Registration of one request in the per-key lock map. Dropping it, on
/// completion or cancellation, removes the entry once no other request
/// holds it.
struct GenerationLockEntry<'a> {
    locks: &'a GenerationLocks,
    key: LockKey,
    lock: Arc<Mutex<()>>,
}

impl<'a> GenerationLockEntry<'a> {
    fn register(locks: &'a GenerationLocks, key: LockKey) -> Self {
        let lock = locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone();
        Self { locks, key, lock }
    }
}

impl Drop for GenerationLockEntry<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = locks.get(&self.key) {
            // map entry + ours
            if Arc::ptr_eq(current, &self.lock) && Arc::strong_count(&self.lock) <= 2 {
                locks.remove(&self.key);
            }
        }
    }
}

/// Composes seed derivation, key generation, encryption and storage
pub struct KeyManager {
    deriver: SeedDeriver,
    registry: GeneratorRegistry,
    codec: EncryptionCodec,
    store: Arc<dyn KeyRecordStore>,
    generation_locks: GenerationLocks,
}

impl KeyManager {
    pub fn new(
        deriver: SeedDeriver,
        registry: GeneratorRegistry,
        codec: EncryptionCodec,
        store: Arc<dyn KeyRecordStore>,
    ) -> Self {
        Self {
            deriver,
            registry,
            codec,
            store,
            generation_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Manager with the default `bitcoin` and `ethereum` generators
    pub fn from_config(config: &KeygenConfig, store: Arc<dyn KeyRecordStore>) -> Self {
        Self::new(
            SeedDeriver::new(config.master_seed.clone()),
            GeneratorRegistry::with_defaults(config.bitcoin),
            EncryptionCodec::from_key(&config.encryption_key),
            store,
        )
    }

    /// Startup work that must not run on the request path
    pub async fn initialize(&self) -> Result<()> {
        self.store.ensure_unique_index().await?;
        info!(networks = ?self.registry.networks(), "Key manager initialized");
        Ok(())
    }

    pub fn networks(&self) -> Vec<&str> {
        self.registry.networks()
    }

    pub fn store(&self) -> &Arc<dyn KeyRecordStore> {
        &self.store
    }

    /// Derive keys without touching storage
    pub fn derive(&self, user_id: u64, network: &str) -> Result<KeyTriple> {
        let generator = self.registry.get(network)?;
        let material = self.generate(user_id, generator)?;
        Ok(KeyTriple::from(&material))
    }

    /// Return the keys for `(user_id, network)`, creating and persisting them
    /// on first use.
    pub async fn resolve(&self, user_id: u64, network: &str) -> Result<KeyTriple> {
        info!(user_id, network, "Request to get keys and address");

        let generator = self.registry.get(network).map_err(|e| {
            warn!(user_id, network, "Unsupported network");
            e
        })?;

        let exists = self.store.exists(user_id, network).await.map_err(|e| {
            error!(user_id, network, error = %e, "Failed to check if keys exist");
            e
        })?;

        if exists {
            return self.retrieve_existing(user_id, network).await;
        }

        if self.store.supports_atomic_upsert() {
            self.generate_and_save(user_id, network, generator).await
        } else {
            self.generate_serialized(user_id, network, generator).await
        }
    }

    async fn retrieve_existing(&self, user_id: u64, network: &str) -> Result<KeyTriple> {
        let record = self.store.get(user_id, network).await.map_err(|e| {
            error!(user_id, network, error = %e, "Failed to retrieve existing keys");
            e
        })?;

        let private_key = self.codec.decrypt(&record.encrypted_private_key).map_err(|e| {
            error!(user_id, network, error = %e, "Failed to decrypt private key");
            e
        })?;

        info!(user_id, network, "Retrieved existing keys");

        Ok(KeyTriple {
            address: record.address,
            public_key: record.public_key,
            private_key,
        })
    }

    async fn generate_and_save(
        &self,
        user_id: u64,
        network: &str,
        generator: &NetworkKeyGenerator,
    ) -> Result<KeyTriple> {
        let material = self.generate(user_id, generator).map_err(|e| {
            error!(user_id, network, error = %e, "Failed to generate key pair");
            e
        })?;

        let encrypted_private_key = self.codec.encrypt(material.private_key()).map_err(|e| {
            error!(user_id, network, error = %e, "Failed to encrypt private key");
            e
        })?;

        let record = KeyRecord {
            user_id,
            network: network.to_string(),
            address: material.address().to_string(),
            public_key: material.public_key().to_string(),
            encrypted_private_key,
        };

        self.store.upsert(&record).await.map_err(|e| {
            error!(user_id, network, error = %e, "Failed to save keys");
            e
        })?;

        info!(user_id, network, address = %record.address, "Successfully generated and saved keys");

        Ok(KeyTriple::from(&material))
    }

    /// Generation for stores without atomic upsert: one generator per key at
    /// a time, with existence re-checked under the lock.
    async fn generate_serialized(
        &self,
        user_id: u64,
        network: &str,
        generator: &NetworkKeyGenerator,
    ) -> Result<KeyTriple> {
        let entry = GenerationLockEntry::register(&self.generation_locks, (user_id, network.to_string()));
        let _guard = entry.lock.lock().await;

        if self.store.exists(user_id, network).await? {
            self.retrieve_existing(user_id, network).await
        } else {
            self.generate_and_save(user_id, network, generator).await
        }
    }

    fn generate(&self, user_id: u64, generator: &NetworkKeyGenerator) -> Result<DerivedKeyMaterial> {
        let seed = self.deriver.derive(user_id)?;
        generator.generate_from_seed(&seed)
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("networks", &self.registry.networks())
            .field("atomic_upsert", &self.store.supports_atomic_upsert())
            .finish_non_exhaustive()
    }
}
