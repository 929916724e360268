//! Cryptographic primitives and operations
//!
//! This module provides per-user seed derivation, per-network key
//! generation, and encryption of private keys for storage.

pub mod secrets;
pub mod seed;
pub mod keys;
pub mod encryption;

pub use secrets::*;
pub use seed::*;
pub use keys::*;
pub use encryption::*;
