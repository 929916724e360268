//! Ethereum key generation

use secp256k1::{All, PublicKey as Secp256k1PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};

use crate::crypto::seed::DerivedSeed;
use crate::error::{Error, Result};
use super::derivation::DerivedKeyMaterial;

/// Generates secp256k1 keys with EIP-55 checksummed addresses
#[derive(Debug, Clone)]
pub struct EthereumKeyGenerator {
    secp: Secp256k1<All>,
}

impl EthereumKeyGenerator {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    /// The seed must already be a valid scalar; it is not reduced.
    pub fn generate_from_seed(&self, seed: &DerivedSeed) -> Result<DerivedKeyMaterial> {
        let secret_key = SecretKey::from_slice(seed.as_bytes())
            .map_err(|e| Error::KeyGeneration(format!("Failed to generate Ethereum private key: {}", e)))?;
        let public_key = Secp256k1PublicKey::from_secret_key(&self.secp, &secret_key);
        let uncompressed = public_key.serialize_uncompressed();

        Ok(DerivedKeyMaterial::new(
            public_key_to_address(&uncompressed)?,
            hex::encode(uncompressed),
            hex::encode(secret_key.secret_bytes()),
        ))
    }
}

impl Default for EthereumKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the checksummed Ethereum address from an uncompressed public key
pub fn public_key_to_address(public_key: &[u8]) -> Result<String> {
    // The public key should be in uncompressed format (65 bytes)
    if public_key.len() != 65 || public_key[0] != 0x04 {
        return Err(Error::KeyGeneration("Invalid Ethereum public key length".to_string()));
    }

    let key_hash = keccak256(&public_key[1..]);
    Ok(to_checksum_address(&key_hash[12..]))
}

/// EIP-55 mixed-case encoding of a 20-byte address
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Calculate the Keccak-256 hash of data
fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::constants::CURVE_ORDER;

    #[test]
    fn test_known_vector() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let material = EthereumKeyGenerator::new()
            .generate_from_seed(&DerivedSeed::from_bytes(bytes))
            .unwrap();

        assert_eq!(material.address(), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
        assert_eq!(
            material.public_key(),
            "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
        assert_eq!(material.private_key(), format!("{:0>64}", "1"));
    }

    #[test]
    fn test_checksum_address() {
        let raw = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(to_checksum_address(&raw), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");

        let raw = hex::decode("fb6916095ca1df60bb79ce92ce3ea74c37c5d359").unwrap();
        assert_eq!(to_checksum_address(&raw), "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");
    }

    #[test]
    fn test_invalid_scalars_are_rejected() {
        let generator = EthereumKeyGenerator::new();
        for bytes in [[0u8; 32], CURVE_ORDER, [0xff; 32]] {
            let result = generator.generate_from_seed(&DerivedSeed::from_bytes(bytes));
            assert!(matches!(result, Err(Error::KeyGeneration(_))));
        }
    }

    #[test]
    fn test_public_key_to_address_validates_length() {
        assert!(public_key_to_address(&[0x04; 33]).is_err());
    }
}
