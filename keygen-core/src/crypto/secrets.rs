//! Process-wide secrets
//!
//! Both values are loaded once at startup and handed to the components that
//! need them. Nothing here is global, so several configurations can live in
//! the same process.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Length of the symmetric encryption key in bytes
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// Root secret of every per-user derivation
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterSeed(Vec<u8>);

impl MasterSeed {
    /// Create a master seed from raw bytes. The seed must not be empty.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::Config("MASTER_SEED must not be empty".to_string()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for MasterSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSeed(<redacted>)")
    }
}

/// 32-byte key used to seal private keys at rest
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; ENCRYPTION_KEY_LEN]);

impl EncryptionKey {
    /// Wrap an already decoded key
    pub fn from_bytes(bytes: [u8; ENCRYPTION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode a standard base64 key and check its length
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(Error::Config("ENCRYPTION_KEY not set".to_string()));
        }

        let mut decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| Error::Config(format!("invalid ENCRYPTION_KEY: {}", e)))?;

        if decoded.len() != ENCRYPTION_KEY_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(Error::Config(format!(
                "ENCRYPTION_KEY must be {} bytes long, got {}",
                ENCRYPTION_KEY_LEN, len
            )));
        }

        let mut key = [0u8; ENCRYPTION_KEY_LEN];
        key.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; ENCRYPTION_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}
