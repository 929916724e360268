//! Keygen Core - deterministic per-user key issuance
//!
//! This library derives a stable secp256k1 identity for every
//! `(user, network)` pair from a single master seed, encrypts the private
//! key for storage, and resolves keys with get-or-create semantics against
//! a pluggable store.

pub mod error;
pub mod config;
pub mod crypto;
pub mod store;
pub mod manager;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use config::KeygenConfig;
pub use crypto::keys::bitcoin::{AddressFormat, BitcoinConfig};
pub use crypto::keys::{GeneratorRegistry, NetworkKeyGenerator, BITCOIN, ETHEREUM};
pub use crypto::{EncryptionCodec, EncryptionKey, MasterSeed, SeedDeriver};
pub use manager::{KeyManager, KeyTriple};
pub use store::{InMemoryKeyRecordStore, KeyRecord, KeyRecordStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
