//! Core transaction pipeline
//!
//! This module contains:
//! - Operations (canonical `[name, payload]` form)
//! - Transactions and their serializable record
//! - Permission levels, authorities and signer resolution
//! - Missing-signature collection from a key store
//! - The transaction builder (construct, sign, broadcast)

pub mod authority;
pub mod builder;
pub mod collector;
pub mod operation;
pub mod transaction;

pub use authority::{Authority, AuthorityResolver, PermissionLevel, ResolvedAuthorities};
pub use builder::{BuilderConfig, Services, TransactionBuilder};
pub use collector::SignatureCollector;
pub use operation::Operation;
pub use transaction::{
    expiration_from_now, Transaction, TransactionError, TransactionRecord,
    DEFAULT_EXPIRATION_SECS, EXPIRATION_FORMAT,
};
