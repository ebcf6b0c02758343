//! Steem TxBuilder: transaction construction and multi-party signing
//!
//! This crate provides:
//! - Canonical unsigned transactions built from raw operation descriptors
//! - Authority resolution across one level of account delegation
//! - Missing-signature collection from a key store
//! - Incremental signing with canonical secp256k1 signatures
//! - Authority-checked broadcast with a dry-run mode
//! - Offline records that carry everything needed to sign elsewhere
//!
//! Node access, key storage and account lookup are collaborators passed in
//! through [`core::Services`].
//!
//! # Example
//!
//! ```ignore
//! use steem_txbuilder::core::{BuilderConfig, PermissionLevel, Services, TransactionBuilder};
//!
//! let mut builder = TransactionBuilder::new(services, BuilderConfig::default());
//! builder.append_operation(serde_json::json!(["vote", {
//!     "voter": "alice", "author": "bob", "permlink": "hello", "weight": 10000
//! }]))?;
//! builder.append_signer("alice", PermissionLevel::Posting)?;
//! builder.sign()?;
//! builder.broadcast()?;
//! ```

pub mod chain;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod wallet;

// Re-export commonly used types
pub use chain::{
    Account, AccountDirectory, ChainClient, ChainError, ChainParams, MemoryAccountDirectory,
    OfflineClient, RefBlock,
};
pub use crate::core::{
    Authority, AuthorityResolver, BuilderConfig, Operation, PermissionLevel, Services,
    SignatureCollector, Transaction, TransactionBuilder, TransactionError, TransactionRecord,
};
pub use crypto::{PrivateKey, PublicKey};
pub use wallet::{KeyStore, Wallet};
