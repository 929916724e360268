//! Key material configuration

use crate::crypto::keys::bitcoin::BitcoinConfig;
use crate::crypto::secrets::{EncryptionKey, MasterSeed};
use crate::error::Result;

/// Everything the key manager needs besides a store. Built once at startup.
#[derive(Debug, Clone)]
pub struct KeygenConfig {
    pub master_seed: MasterSeed,
    pub encryption_key: EncryptionKey,
    pub bitcoin: BitcoinConfig,
}

impl KeygenConfig {
    pub fn new(master_seed: MasterSeed, encryption_key: EncryptionKey) -> Self {
        Self {
            master_seed,
            encryption_key,
            bitcoin: BitcoinConfig::default(),
        }
    }

    /// Build from the raw values found in the environment
    pub fn from_raw(master_seed: &str, encryption_key: &str) -> Result<Self> {
        Ok(Self::new(
            MasterSeed::new(master_seed.as_bytes())?,
            EncryptionKey::from_base64(encryption_key)?,
        ))
    }

    pub fn with_bitcoin(mut self, bitcoin: BitcoinConfig) -> Self {
        self.bitcoin = bitcoin;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::bitcoin::{AddressFormat, Network};
    use crate::error::Error;

    #[test]
    fn test_from_raw() {
        let config = KeygenConfig::from_raw("seed", "4GRrhM8ClnrSmCrDvyFzPKdkJF9NcRkKwxlmIrsYhx0=").unwrap();
        assert_eq!(config.master_seed.as_bytes(), b"seed");
        assert_eq!(config.bitcoin, BitcoinConfig::default());

        let config = config.with_bitcoin(BitcoinConfig {
            network: Network::Testnet,
            address_format: AddressFormat::P2wpkh,
        });
        assert_eq!(config.bitcoin.network, Network::Testnet);
    }

    #[test]
    fn test_from_raw_rejects_missing_values() {
        let key = "4GRrhM8ClnrSmCrDvyFzPKdkJF9NcRkKwxlmIrsYhx0=";
        assert!(matches!(KeygenConfig::from_raw("", key), Err(Error::Config(_))));
        assert!(matches!(KeygenConfig::from_raw("seed", ""), Err(Error::Config(_))));
    }
}
