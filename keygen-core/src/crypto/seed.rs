//! Per-user seed derivation

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use super::secrets::MasterSeed;

/// Length of a derived seed in bytes
pub const SEED_LEN: usize = 32;

/// A 32-byte seed bound to one user. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedSeed([u8; SEED_LEN]);

impl DerivedSeed {
    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedSeed(<redacted>)")
    }
}

/// HMAC-SHA256 over the big-endian 8-byte user id, keyed by the master seed
pub fn derive_seed(master_seed: &[u8], user_id: u64) -> Result<DerivedSeed> {
    let mut mac = Hmac::<Sha256>::new_from_slice(master_seed)
        .map_err(|_| Error::KeyGeneration("HMAC error".to_string()))?;

    mac.update(&user_id.to_be_bytes());
    let result = mac.finalize().into_bytes();

    let mut seed = [0u8; SEED_LEN];
    seed.copy_from_slice(&result);
    Ok(DerivedSeed(seed))
}

/// Holds the master seed and derives user seeds from it
#[derive(Debug, Clone)]
pub struct SeedDeriver {
    master_seed: MasterSeed,
}

impl SeedDeriver {
    pub fn new(master_seed: MasterSeed) -> Self {
        Self { master_seed }
    }

    pub fn derive(&self, user_id: u64) -> Result<DerivedSeed> {
        derive_seed(self.master_seed.as_bytes(), user_id)
    }
}
