//! Key generation per network
//!
//! Each network turns a derived seed into an address, public key and
//! private key using secp256k1 and its own encoding rules.

pub mod ethereum;
pub mod bitcoin;
mod derivation;

pub use derivation::*;
