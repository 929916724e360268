//! Bitcoin key generation

use std::fmt;
use std::str::FromStr;

use bitcoin::secp256k1::{constants::CURVE_ORDER, All, Secp256k1, SecretKey};
use bitcoin::{Address, PrivateKey};
pub use bitcoin::Network;

use crate::crypto::seed::{DerivedSeed, SEED_LEN};
use crate::error::{Error, Result};
use super::derivation::DerivedKeyMaterial;

/// Address encoding used for every issued Bitcoin key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressFormat {
    /// Legacy base58 pay-to-pubkey-hash
    #[default]
    P2pkh,
    /// Native segwit v0 pay-to-witness-pubkey-hash (bech32)
    P2wpkh,
}

impl FromStr for AddressFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p2pkh" | "legacy" => Ok(Self::P2pkh),
            "p2wpkh" | "segwit" | "bech32" => Ok(Self::P2wpkh),
            other => Err(Error::Config(format!("Unknown Bitcoin address format: {}", other))),
        }
    }
}

impl fmt::Display for AddressFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P2pkh => f.write_str("p2pkh"),
            Self::P2wpkh => f.write_str("p2wpkh"),
        }
    }
}

/// Parse a Bitcoin network name. `mainnet` is accepted as an alias of `bitcoin`.
pub fn parse_network(s: &str) -> Result<Network> {
    match s.trim().to_ascii_lowercase().as_str() {
        "mainnet" | "bitcoin" => Ok(Network::Bitcoin),
        "testnet" => Ok(Network::Testnet),
        "signet" => Ok(Network::Signet),
        "regtest" => Ok(Network::Regtest),
        other => Err(Error::Config(format!("Unknown Bitcoin network: {}", other))),
    }
}

/// Fixed encoding choice for the Bitcoin generator. Mainnet P2PKH by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitcoinConfig {
    pub network: Network,
    pub address_format: AddressFormat,
}

impl Default for BitcoinConfig {
    fn default() -> Self {
        Self {
            network: Network::Bitcoin,
            address_format: AddressFormat::P2pkh,
        }
    }
}

/// Generates compressed secp256k1 keys with WIF private keys
#[derive(Debug, Clone)]
pub struct BitcoinKeyGenerator {
    config: BitcoinConfig,
    secp: Secp256k1<All>,
}

impl BitcoinKeyGenerator {
    pub fn new(config: BitcoinConfig) -> Self {
        Self {
            config,
            secp: Secp256k1::new(),
        }
    }

    pub fn config(&self) -> BitcoinConfig {
        self.config
    }

    pub fn generate_from_seed(&self, seed: &DerivedSeed) -> Result<DerivedKeyMaterial> {
        let scalar = reduce_scalar(seed.as_bytes());
        let secret_key = SecretKey::from_slice(&scalar)
            .map_err(|e| Error::KeyGeneration(format!("Invalid secret key: {}", e)))?;

        let private_key = PrivateKey::new(secret_key, self.config.network);
        let public_key = private_key.public_key(&self.secp);

        let address = match self.config.address_format {
            AddressFormat::P2pkh => Address::p2pkh(&public_key, self.config.network),
            AddressFormat::P2wpkh => Address::p2wpkh(&public_key, self.config.network)
                .map_err(|e| Error::KeyGeneration(format!("Failed to generate Bitcoin address: {}", e)))?,
        };

        Ok(DerivedKeyMaterial::new(
            address.to_string(),
            hex::encode(public_key.inner.serialize()),
            private_key.to_wif(),
        ))
    }
}

/// Reduce a big-endian 256-bit value modulo the curve order.
///
/// Any 256-bit value is below `2n`, so at most one subtraction is needed.
fn reduce_scalar(seed: &[u8; SEED_LEN]) -> [u8; SEED_LEN] {
    if seed[..] < CURVE_ORDER[..] {
        return *seed;
    }

    let mut out = [0u8; SEED_LEN];
    let mut borrow = 0i16;
    for i in (0..SEED_LEN).rev() {
        let mut diff = seed[i] as i16 - CURVE_ORDER[i] as i16 - borrow;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        } else {
            borrow = 0;
        }
        out[i] = diff as u8;
    }
    out
}
