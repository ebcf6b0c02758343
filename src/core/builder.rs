//! Transaction builder
//!
//! Accumulates operations, keeps the unsigned transaction in sync with the
//! chain head, collects signing keys, signs incrementally, and broadcasts
//! after an authority check.
//!
//! # Example
//!
//! ```ignore
//! let mut builder = TransactionBuilder::new(services, BuilderConfig::default());
//! builder.append_operation(json!(["vote", {"voter": "alice", ...}]))?;
//! builder.add_signing_information("alice", PermissionLevel::Posting)?;
//! builder.append_missing_signatures()?;
//! builder.sign()?;
//! builder.broadcast()?;
//! ```

use crate::chain::{AccountDirectory, ChainClient, ChainParams};
use crate::core::authority::{AuthorityResolver, PermissionLevel};
use crate::core::collector::SignatureCollector;
use crate::core::transaction::{
    expiration_from_now, Transaction, TransactionError, TransactionRecord,
    DEFAULT_EXPIRATION_SECS,
};
use crate::core::Operation;
use crate::crypto::{PrivateKey, PublicKey};
use crate::wallet::KeyStore;
use serde_json::Value;
use std::sync::Arc;

/// Builder options
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Log instead of submitting on broadcast
    pub no_broadcast: bool,
    /// Seconds from construction until the transaction expires
    pub expiration_secs: i64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            no_broadcast: false,
            expiration_secs: DEFAULT_EXPIRATION_SECS,
        }
    }
}

/// Collaborators the builder talks to
#[derive(Clone)]
pub struct Services {
    pub chain: Arc<dyn ChainClient>,
    pub keystore: Arc<dyn KeyStore>,
    pub accounts: Arc<dyn AccountDirectory>,
}

/// Validate WIF key material, keeping key errors apart from other failures
pub(crate) fn parse_key_material(wif: &str) -> Result<PrivateKey, TransactionError> {
    PrivateKey::from_wif(wif).map_err(TransactionError::InvalidKeyFormat)
}

/// Builds, signs and broadcasts one transaction.
///
/// Not meant for concurrent use: every mutating call takes `&mut self`.
pub struct TransactionBuilder {
    services: Services,
    config: BuilderConfig,
    /// Operation descriptors as appended
    raw_operations: Vec<Value>,
    /// Validated keys waiting for the next `sign()`
    signers: Vec<PrivateKey>,
    record: TransactionRecord,
}

impl TransactionBuilder {
    /// Create an empty builder
    pub fn new(services: Services, config: BuilderConfig) -> Self {
        Self {
            services,
            config,
            raw_operations: Vec::new(),
            signers: Vec::new(),
            record: TransactionRecord::default(),
        }
    }

    /// Seed a builder from an existing transaction record.
    ///
    /// The record's operations become the accumulated operations, so later
    /// appends extend rather than replace them.
    pub fn from_record(
        value: Value,
        services: Services,
        config: BuilderConfig,
    ) -> Result<Self, TransactionError> {
        let record = TransactionRecord::from_value(value)?;
        let raw_operations = record.operations.iter().map(Operation::to_raw).collect();

        Ok(Self {
            services,
            config,
            raw_operations,
            signers: Vec::new(),
            record,
        })
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Append one operation descriptor and rebuild the transaction
    pub fn append_operation(&mut self, raw: Value) -> Result<(), TransactionError> {
        self.append_operations(std::iter::once(raw))
    }

    /// Append operation descriptors and rebuild the transaction.
    ///
    /// Reference block and expiration are refreshed from the chain on every
    /// call. Nothing is changed if a descriptor is malformed or the chain
    /// cannot be reached.
    pub fn append_operations<I>(&mut self, raws: I) -> Result<(), TransactionError>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut raw_operations = self.raw_operations.clone();
        raw_operations.extend(raws);

        let tx = self.construct(&raw_operations)?;
        if !self.record.signatures.is_empty() {
            log::warn!(
                "Rebuilt transaction already carries {} signature(s) that no longer cover it",
                self.record.signatures.len()
            );
        }

        self.raw_operations = raw_operations;
        self.record.set_transaction(tx);
        Ok(())
    }

    fn construct(&self, raw_operations: &[Value]) -> Result<Transaction, TransactionError> {
        let operations = raw_operations
            .iter()
            .map(Operation::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        let ref_block = self.services.chain.reference_block_params()?;
        let expiration = expiration_from_now(self.config.expiration_secs);

        log::debug!(
            "constructed transaction: {} operation(s), ref block {}/{}, expires {}",
            operations.len(),
            ref_block.num,
            ref_block.prefix,
            expiration
        );

        Ok(Transaction::new(ref_block, expiration, operations))
    }

    // =========================================================================
    // Signers
    // =========================================================================

    /// Queue `account`'s key for `level` from the key store
    pub fn append_signer(
        &mut self,
        account: &str,
        level: PermissionLevel,
    ) -> Result<(), TransactionError> {
        let account = self.services.accounts.lookup(account)?;
        let wif = self
            .services
            .keystore
            .key_for_permission(&account.name, level)
            .ok_or(TransactionError::MissingSigningKey)?;
        self.append_private_key(&wif)
    }

    /// Queue a WIF key; malformed input leaves the queue untouched
    pub fn append_private_key(&mut self, wif: &str) -> Result<(), TransactionError> {
        let key = parse_key_material(wif)?;
        self.signers.push(key);
        Ok(())
    }

    /// Record who must sign, for later or offline signing.
    ///
    /// Replaces `required_authorities` and `missing_signatures` and embeds
    /// the chain parameters.
    pub fn add_signing_information(
        &mut self,
        account: &str,
        level: PermissionLevel,
    ) -> Result<(), TransactionError> {
        let resolved =
            AuthorityResolver::new(self.services.accounts.as_ref()).resolve(account, level)?;

        self.record.required_authorities = Some(resolved.required);
        self.record.missing_signatures = Some(resolved.missing);
        self.record.blockchain = Some(self.services.chain.chain_params());
        Ok(())
    }

    /// Queue the keys the key store holds for `missing_signatures`.
    ///
    /// Returns how many keys were queued. Keys already queued are skipped.
    pub fn append_missing_signatures(&mut self) -> Result<usize, TransactionError> {
        let missing = self.record.missing_signatures.clone().unwrap_or_default();
        let keys = SignatureCollector::new(self.services.keystore.as_ref()).collect(&missing)?;

        let mut added = 0;
        for key in keys {
            if !self.signers.contains(&key) {
                self.signers.push(key);
                added += 1;
            }
        }
        Ok(added)
    }

    // =========================================================================
    // Signing & broadcast
    // =========================================================================

    /// Sign with every queued key and append the signatures.
    ///
    /// Uses the embedded chain parameters when present, otherwise the
    /// client's. The queue is consumed only on success.
    pub fn sign(&mut self) -> Result<(), TransactionError> {
        if self.signers.is_empty() {
            return Err(TransactionError::MissingSigningKey);
        }

        let tx = self.record.transaction();
        tx.validate()?;

        let chain = self.signing_chain();
        let digest = tx.digest(&chain)?;
        let signatures = self
            .signers
            .iter()
            .map(|key| key.sign_digest(&digest).map(hex::encode))
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "Signed transaction {} with {} key(s)",
            tx.id()?,
            signatures.len()
        );

        self.record.signatures.extend(signatures);
        self.signers.clear();
        Ok(())
    }

    /// Check authority and submit, returning the submitted state.
    ///
    /// In dry-run mode nothing is sent. Failures leave the signed state
    /// intact so the call can be repeated.
    pub fn broadcast(&self) -> Result<TransactionRecord, TransactionError> {
        let record = self.to_record();

        if self.config.no_broadcast {
            log::warn!("Not broadcasting anything!");
            return Ok(record);
        }

        if !self.services.chain.verify_authority(&record)? {
            return Err(TransactionError::InsufficientAuthority);
        }

        let ack = self
            .services
            .chain
            .broadcast_transaction(&record)
            .map_err(|e| TransactionError::TransmissionFailure(e.to_string()))?;
        log::info!("Broadcast transaction {}", ack.transaction_id);

        Ok(record)
    }

    // =========================================================================
    // State
    // =========================================================================

    fn signing_chain(&self) -> ChainParams {
        self.record
            .blockchain
            .clone()
            .unwrap_or_else(|| self.services.chain.chain_params())
    }

    /// Snapshot of the externally visible state
    pub fn to_record(&self) -> TransactionRecord {
        self.record.clone()
    }

    pub fn to_value(&self) -> Result<Value, TransactionError> {
        self.record.to_value()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.record.operations
    }

    pub fn signatures(&self) -> &[String] {
        &self.record.signatures
    }

    pub fn missing_signatures(&self) -> Option<&[String]> {
        self.record.missing_signatures.as_deref()
    }

    /// Public keys of the queued signers
    pub fn pending_signers(&self) -> Vec<PublicKey> {
        self.signers.iter().map(PrivateKey::public_key).collect()
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }
}
