//! Chain-side collaborators
//!
//! Traits for the node client and account lookup, plus the offline and
//! in-memory implementations used for cold signing and tests.

pub mod accounts;
pub mod client;

pub use accounts::{Account, AccountDirectory, MemoryAccountDirectory};
pub use client::{
    BroadcastAck, ChainClient, ChainError, ChainParams, OfflineClient, RefBlock, STEEM_CHAIN_ID,
};
