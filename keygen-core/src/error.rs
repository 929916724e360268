//! Error types for the keygen-core library

use thiserror::Error;

/// Custom error type for key issuance operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Key not found for user {user_id} on {network}")]
    NotFound { user_id: u64, network: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The caller sent something we cannot serve (bad network tag, bad id).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedNetwork(_) | Self::InvalidInput(_))
    }

    /// Infrastructure faults the caller may retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Integrity or derivation failures. Never retried with other key material.
    pub fn is_crypto_failure(&self) -> bool {
        matches!(self, Self::Crypto(_) | Self::KeyGeneration(_))
    }
}

/// Result type for keygen-core operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(Error::UnsupportedNetwork("dogecoin".into()).is_client_error());
        assert!(Error::Storage("down".into()).is_retryable());
        assert!(!Error::Crypto("tag".into()).is_retryable());
        assert!(Error::KeyGeneration("zero scalar".into()).is_crypto_failure());

        let not_found = Error::NotFound { user_id: 7, network: "bitcoin".into() };
        assert!(!not_found.is_crypto_failure());
        assert_eq!(not_found.to_string(), "Key not found for user 7 on bitcoin");
    }
}
