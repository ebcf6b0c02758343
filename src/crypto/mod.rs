//! Cryptographic utilities for transaction signing
//!
//! This module provides:
//! - SHA-256 and RIPEMD-160 hashing
//! - WIF private keys and prefixed public keys (secp256k1)
//! - Canonical recoverable signatures

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, ripemd160, sha256, sha256_hex};
pub use keys::{KeyError, PrivateKey, PublicKey, DEFAULT_KEY_PREFIX, SIGNATURE_LENGTH};
