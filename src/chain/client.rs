//! Chain node access
//!
//! The builder only needs four things from a node: recent reference block
//! parameters, an authority check, transaction submission, and the chain
//! identity used in signing digests. Transport is left to implementors.

use crate::core::TransactionRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain id of the Steem main network
pub const STEEM_CHAIN_ID: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Errors raised by chain collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),
    #[error("Invalid block id: {0}")]
    InvalidBlockId(String),
    #[error("Node unavailable in offline mode: {0}")]
    Offline(String),
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error("RPC error: {0}")]
    Rpc(String),
}

/// Chain identity embedded alongside a transaction for deferred signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Hex-encoded 32-byte chain id
    pub chain_id: String,
    /// Public key prefix
    pub prefix: String,
}

impl ChainParams {
    pub fn new(chain_id: &str, prefix: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            prefix: prefix.to_string(),
        }
    }

    /// Decoded chain id, which must be exactly 32 bytes
    pub fn chain_id_bytes(&self) -> Result<Vec<u8>, ChainError> {
        let bytes =
            hex::decode(&self.chain_id).map_err(|_| ChainError::InvalidChainId(self.chain_id.clone()))?;
        if bytes.len() != 32 {
            return Err(ChainError::InvalidChainId(self.chain_id.clone()));
        }
        Ok(bytes)
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::new(STEEM_CHAIN_ID, crate::crypto::DEFAULT_KEY_PREFIX)
    }
}

/// Reference block parameters that bound a transaction's validity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefBlock {
    pub num: u16,
    pub prefix: u32,
}

impl RefBlock {
    /// Derive parameters from a reference block's number and hex id.
    ///
    /// `num` keeps the low 16 bits of the height, `prefix` is the
    /// little-endian u32 at byte offset 4 of the id.
    pub fn from_block(block_number: u64, block_id: &str) -> Result<Self, ChainError> {
        let id = hex::decode(block_id).map_err(|_| ChainError::InvalidBlockId(block_id.to_string()))?;
        if id.len() < 8 {
            return Err(ChainError::InvalidBlockId(block_id.to_string()));
        }

        Ok(Self {
            num: (block_number & 0xFFFF) as u16,
            prefix: u32::from_le_bytes([id[4], id[5], id[6], id[7]]),
        })
    }
}

/// Node acknowledgement of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastAck {
    pub transaction_id: String,
}

/// Blocking access to a chain node
pub trait ChainClient: Send + Sync {
    /// Current reference block parameters
    fn reference_block_params(&self) -> Result<RefBlock, ChainError>;

    /// Ask the node whether the signatures satisfy the required authorities
    fn verify_authority(&self, tx: &TransactionRecord) -> Result<bool, ChainError>;

    /// Submit a signed transaction
    fn broadcast_transaction(&self, tx: &TransactionRecord) -> Result<BroadcastAck, ChainError>;

    /// Identity of the connected chain
    fn chain_params(&self) -> ChainParams;
}

/// Client for cold-storage machines without a node.
///
/// Signing only needs [`ChainParams`]; every network call fails with
/// [`ChainError::Offline`] unless a fixed reference block was supplied.
#[derive(Debug, Clone, Default)]
pub struct OfflineClient {
    params: ChainParams,
    ref_block: Option<RefBlock>,
}

impl OfflineClient {
    pub fn new(params: ChainParams) -> Self {
        Self {
            params,
            ref_block: None,
        }
    }

    /// Use fixed reference block parameters, e.g. copied from an online machine
    pub fn with_ref_block(mut self, ref_block: RefBlock) -> Self {
        self.ref_block = Some(ref_block);
        self
    }
}

impl ChainClient for OfflineClient {
    fn reference_block_params(&self) -> Result<RefBlock, ChainError> {
        self.ref_block
            .ok_or_else(|| ChainError::Offline("reference block lookup".to_string()))
    }

    fn verify_authority(&self, _tx: &TransactionRecord) -> Result<bool, ChainError> {
        Err(ChainError::Offline("authority verification".to_string()))
    }

    fn broadcast_transaction(&self, _tx: &TransactionRecord) -> Result<BroadcastAck, ChainError> {
        Err(ChainError::Offline("broadcast".to_string()))
    }

    fn chain_params(&self) -> ChainParams {
        self.params.clone()
    }
}
