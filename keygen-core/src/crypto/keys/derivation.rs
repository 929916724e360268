//! Common key generation functionality

use std::collections::HashMap;
use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::seed::DerivedSeed;
use crate::error::{Error, Result};
use super::bitcoin::{BitcoinConfig, BitcoinKeyGenerator};
use super::ethereum::EthereumKeyGenerator;

/// Network tag for Bitcoin
pub const BITCOIN: &str = "bitcoin";

/// Network tag for Ethereum
pub const ETHEREUM: &str = "ethereum";

/// Address and keys derived from a seed. Lives only in memory and is wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeyMaterial {
    address: String,
    public_key: String,
    private_key: String,
}

impl DerivedKeyMaterial {
    pub fn new(address: String, public_key: String, private_key: String) -> Self {
        Self {
            address,
            public_key,
            private_key,
        }
    }

    /// Network-native encoded address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Hex-encoded public key
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Network-encoded private key (WIF for Bitcoin, hex for Ethereum)
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl fmt::Debug for DerivedKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeyMaterial")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Key generator for one network
#[derive(Debug, Clone)]
pub enum NetworkKeyGenerator {
    Bitcoin(BitcoinKeyGenerator),
    Ethereum(EthereumKeyGenerator),
}

impl NetworkKeyGenerator {
    pub fn generate_from_seed(&self, seed: &DerivedSeed) -> Result<DerivedKeyMaterial> {
        match self {
            Self::Bitcoin(generator) => generator.generate_from_seed(seed),
            Self::Ethereum(generator) => generator.generate_from_seed(seed),
        }
    }
}

/// Maps network tags to generators. Filled once at startup.
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    generators: HashMap<String, NetworkKeyGenerator>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `bitcoin` and `ethereum`
    pub fn with_defaults(bitcoin: BitcoinConfig) -> Self {
        let mut registry = Self::new();
        registry.register(BITCOIN, NetworkKeyGenerator::Bitcoin(BitcoinKeyGenerator::new(bitcoin)));
        registry.register(ETHEREUM, NetworkKeyGenerator::Ethereum(EthereumKeyGenerator::new()));
        registry
    }

    /// Register a generator, replacing any previous one under the same tag
    pub fn register(&mut self, network: impl Into<String>, generator: NetworkKeyGenerator) {
        self.generators.insert(network.into(), generator);
    }

    /// Look up a generator by exact tag
    pub fn get(&self, network: &str) -> Result<&NetworkKeyGenerator> {
        self.generators
            .get(network)
            .ok_or_else(|| Error::UnsupportedNetwork(network.to_string()))
    }

    pub fn contains(&self, network: &str) -> bool {
        self.generators.contains_key(network)
    }

    /// Registered tags, sorted
    pub fn networks(&self) -> Vec<&str> {
        let mut networks: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        networks.sort_unstable();
        networks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::secrets::MasterSeed;
    use crate::crypto::seed::SeedDeriver;

    #[test]
    fn test_default_registry() {
        let registry = GeneratorRegistry::with_defaults(BitcoinConfig::default());
        assert_eq!(registry.networks(), vec!["bitcoin", "ethereum"]);
        assert!(matches!(registry.get("bitcoin"), Ok(NetworkKeyGenerator::Bitcoin(_))));
        assert!(matches!(registry.get("ethereum"), Ok(NetworkKeyGenerator::Ethereum(_))));
    }

    #[test]
    fn test_unknown_network() {
        let registry = GeneratorRegistry::with_defaults(BitcoinConfig::default());
        assert!(matches!(registry.get("dogecoin"), Err(Error::UnsupportedNetwork(n)) if n == "dogecoin"));
        assert!(matches!(registry.get("Bitcoin"), Err(Error::UnsupportedNetwork(_))));
    }

    #[test]
    fn test_generation_is_deterministic_per_network() {
        let deriver = SeedDeriver::new(MasterSeed::new("test-master-seed-1234").unwrap());
        let registry = GeneratorRegistry::with_defaults(BitcoinConfig::default());

        for network in registry.networks() {
            let generator = registry.get(network).unwrap();
            let first = generator.generate_from_seed(&deriver.derive(1).unwrap()).unwrap();
            let second = generator.generate_from_seed(&deriver.derive(1).unwrap()).unwrap();
            assert_eq!(first, second, "{} is not deterministic", network);
        }
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let material = DerivedKeyMaterial::new("addr".into(), "pub".into(), "secret-wif".into());
        let rendered = format!("{:?}", material);
        assert!(rendered.contains("addr"));
        assert!(!rendered.contains("secret-wif"));
    }
}
