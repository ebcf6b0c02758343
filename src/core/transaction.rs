//! Transactions and their serializable record
//!
//! [`Transaction`] is the unsigned body that gets signed. [`TransactionRecord`]
//! is the full externally visible state: the body, the signatures collected
//! so far, and the side information that lets other parties sign later
//! without a node connection.

use crate::chain::{ChainError, ChainParams, RefBlock};
use crate::core::{Authority, Operation};
use crate::crypto::{sha256, KeyError, PublicKey};
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Default validity window of a new transaction, in seconds
pub const DEFAULT_EXPIRATION_SECS: i64 = 30;

/// Timestamp format of the `expiration` field (UTC, no zone suffix)
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Number of digest bytes that make up a transaction id
const TRANSACTION_ID_BYTES: usize = 20;

// =============================================================================
// Error Types
// =============================================================================

/// Errors of the construction / signing / broadcast pipeline
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Invalid transaction construction input: {0}")]
    InvalidConstructionInput(String),
    #[error("Invalid permission level: {0}")]
    InvalidPermissionLevel(String),
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(KeyError),
    #[error("No signing key available")]
    MissingSigningKey,
    #[error("Signatures do not satisfy the required authority")]
    InsufficientAuthority,
    #[error("Transaction could not be transmitted: {0}")]
    TransmissionFailure(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Chain error: {0}")]
    Chain(ChainError),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<ChainError> for TransactionError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::AccountNotFound(name) => TransactionError::AccountNotFound(name),
            other => TransactionError::Chain(other),
        }
    }
}

/// Expiration timestamp `secs` seconds from now
pub fn expiration_from_now(secs: i64) -> String {
    (Utc::now() + Duration::seconds(secs))
        .format(EXPIRATION_FORMAT)
        .to_string()
}

// =============================================================================
// Unsigned Transaction
// =============================================================================

/// The signable part of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: String,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub extensions: Vec<Value>,
}

impl Transaction {
    pub fn new(ref_block: RefBlock, expiration: String, operations: Vec<Operation>) -> Self {
        Self {
            ref_block_num: ref_block.num,
            ref_block_prefix: ref_block.prefix,
            expiration,
            operations,
            extensions: Vec::new(),
        }
    }

    /// Check the body is complete enough to sign
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.operations.is_empty() {
            return Err(TransactionError::InvalidConstructionInput(
                "transaction has no operations".to_string(),
            ));
        }

        NaiveDateTime::parse_from_str(&self.expiration, EXPIRATION_FORMAT).map_err(|_| {
            TransactionError::InvalidConstructionInput(format!(
                "invalid expiration: {:?}",
                self.expiration
            ))
        })?;

        Ok(())
    }

    /// Bytes covered by the signing digest.
    ///
    /// Canonical JSON: field order is fixed by the struct and payload maps
    /// are key-sorted.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// SHA-256 over chain id followed by the serialized body
    pub fn digest(&self, chain: &ChainParams) -> Result<Vec<u8>, TransactionError> {
        let mut data = chain.chain_id_bytes()?;
        data.extend_from_slice(&self.to_bytes()?);
        Ok(sha256(&data))
    }

    /// Transaction id: leading bytes of the body hash, hex-encoded
    pub fn id(&self) -> Result<String, TransactionError> {
        let hash = sha256(&self.to_bytes()?);
        Ok(hex::encode(&hash[..TRANSACTION_ID_BYTES]))
    }
}

// =============================================================================
// Transaction Record
// =============================================================================

/// Serializable builder state.
///
/// Every field has a default so partially filled records (e.g. `{}`) are
/// accepted as seeds; completeness is checked when signing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionRecord {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: String,
    pub operations: Vec<Operation>,
    pub extensions: Vec<Value>,
    pub signatures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_authorities: Option<BTreeMap<String, Authority>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_signatures: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<ChainParams>,
}

impl TransactionRecord {
    /// Parse a transaction-shaped JSON value
    pub fn from_value(value: Value) -> Result<Self, TransactionError> {
        if !value.is_object() {
            return Err(TransactionError::InvalidConstructionInput(format!(
                "expected a transaction object, got {}",
                value
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| TransactionError::InvalidConstructionInput(e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value, TransactionError> {
        Ok(serde_json::to_value(self)?)
    }

    /// The unsigned body
    pub fn transaction(&self) -> Transaction {
        Transaction {
            ref_block_num: self.ref_block_num,
            ref_block_prefix: self.ref_block_prefix,
            expiration: self.expiration.clone(),
            operations: self.operations.clone(),
            extensions: self.extensions.clone(),
        }
    }

    /// Overwrite the body fields, keeping signatures and side information
    pub fn set_transaction(&mut self, tx: Transaction) {
        self.ref_block_num = tx.ref_block_num;
        self.ref_block_prefix = tx.ref_block_prefix;
        self.expiration = tx.expiration;
        self.operations = tx.operations;
        self.extensions = tx.extensions;
    }

    /// Append signatures from another copy of the same transaction.
    ///
    /// Signatures already present are skipped. Returns how many were added.
    pub fn merge_signatures(&mut self, other: &TransactionRecord) -> Result<usize, TransactionError> {
        if self.transaction() != other.transaction() {
            return Err(TransactionError::InvalidConstructionInput(
                "cannot merge signatures of different transactions".to_string(),
            ));
        }

        let mut added = 0;
        for signature in &other.signatures {
            if !self.signatures.contains(signature) {
                self.signatures.push(signature.clone());
                added += 1;
            }
        }
        Ok(added)
    }

    /// Public keys that produced the current signatures, in order
    pub fn recover_signers(&self, chain: &ChainParams) -> Result<Vec<PublicKey>, TransactionError> {
        let digest = self.transaction().digest(chain)?;
        self.signatures
            .iter()
            .map(|signature| -> Result<PublicKey, TransactionError> {
                let bytes = hex::decode(signature).map_err(|_| KeyError::InvalidSignature)?;
                Ok(PublicKey::recover(&digest, &bytes)?)
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
