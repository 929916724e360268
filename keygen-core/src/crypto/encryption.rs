//! Authenticated encryption of private keys at rest
//!
//! Tokens are `base64(nonce || ciphertext || tag)` produced by
//! XChaCha20-Poly1305 with a fresh random 24-byte nonce per call and no
//! associated data.

use base64::{engine::general_purpose, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::error::{Error, Result};
use super::secrets::EncryptionKey;

/// XChaCha20-Poly1305 nonce length
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length
pub const TAG_LEN: usize = 16;

/// Seals and opens private-key strings under the process encryption key
#[derive(Clone)]
pub struct EncryptionCodec {
    cipher: XChaCha20Poly1305,
}

impl EncryptionCodec {
    /// Decode and validate base64 key material. Called once at startup.
    pub fn setup(key_material: &str) -> Result<Self> {
        let key = EncryptionKey::from_base64(key_material)?;
        Ok(Self::from_key(&key))
    }

    pub fn from_key(key: &EncryptionKey) -> Self {
        let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
        Self { cipher }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| Error::Crypto(format!("Failed to generate nonce: {}", e)))?;

        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

        let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(token))
    }

    pub fn decrypt(&self, token: &str) -> Result<String> {
        let data = general_purpose::STANDARD
            .decode(token)
            .map_err(|e| Error::Crypto(format!("Invalid ciphertext encoding: {}", e)))?;

        if data.len() < NONCE_LEN {
            return Err(Error::Crypto("ciphertext too short".to_string()));
        }

        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Crypto("Failed to decrypt private key (tampered data or wrong key)".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::Crypto("Decrypted private key is not valid UTF-8".to_string()))
    }
}

impl std::fmt::Debug for EncryptionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIF: &str = "cRwricgLMcpyF4nXqJS8gDdfrtpfqjPmkq9K7EdUkJf79yPffY6N";

    fn codec() -> EncryptionCodec {
        EncryptionCodec::setup("4GRrhM8ClnrSmCrDvyFzPKdkJF9NcRkKwxlmIrsYhx0=").unwrap()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let codec = codec();
        let token = codec.encrypt(WIF).unwrap();
        assert_ne!(token, WIF);
        assert_eq!(codec.decrypt(&token).unwrap(), WIF);
    }

    #[test]
    fn test_token_layout() {
        let token = codec().encrypt("abc").unwrap();
        let raw = general_purpose::STANDARD.decode(token).unwrap();
        assert_eq!(raw.len(), NONCE_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let codec = codec();
        let a = codec.encrypt(WIF).unwrap();
        let b = codec.encrypt(WIF).unwrap();
        assert_ne!(a, b);
        assert_eq!(codec.decrypt(&a).unwrap(), codec.decrypt(&b).unwrap());
    }

    #[test]
    fn test_tampering_is_detected() {
        let codec = codec();
        let raw = general_purpose::STANDARD.decode(codec.encrypt(WIF).unwrap()).unwrap();

        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let token = general_purpose::STANDARD.encode(&tampered);
            assert!(matches!(codec.decrypt(&token), Err(Error::Crypto(_))), "byte {} accepted", i);
        }
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let token = codec().encrypt(WIF).unwrap();
        let other = EncryptionCodec::from_key(&EncryptionKey::from_bytes([3u8; 32]));
        assert!(matches!(other.decrypt(&token), Err(Error::Crypto(_))));
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = codec();
        assert!(matches!(codec.decrypt("%%%"), Err(Error::Crypto(_))));

        let short = general_purpose::STANDARD.encode([0u8; NONCE_LEN - 1]);
        assert!(matches!(codec.decrypt(&short), Err(Error::Crypto(_))));
    }

    #[test]
    fn test_setup_rejects_bad_keys() {
        assert!(matches!(EncryptionCodec::setup(""), Err(Error::Config(_))));
        assert!(matches!(EncryptionCodec::setup("c2hvcnQ="), Err(Error::Config(_))));
    }
}
