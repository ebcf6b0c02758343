//! Key storage
//!
//! The builder asks a [`KeyStore`] for key material in two ways: by account
//! and permission level (explicit signers) and by public key (resolving
//! missing signatures). [`Wallet`] is a plain in-memory store that can be
//! persisted as JSON; encryption at rest is left to other implementations.

use crate::core::PermissionLevel;
use crate::crypto::{KeyError, PrivateKey, DEFAULT_KEY_PREFIX};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// Source of private key material.
///
/// Implementations return the stored WIF as-is; the caller validates it.
pub trait KeyStore: Send + Sync {
    /// Key authorised for `account` at `level`, if held
    fn key_for_permission(&self, account: &str, level: PermissionLevel) -> Option<String>;

    /// Private key matching a textual public key, if held
    fn private_key_for_public_key(&self, public_key: &str) -> Option<String>;
}

fn default_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

/// In-memory key store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Public key prefix used to index keys
    #[serde(default = "default_prefix")]
    prefix: String,
    /// WIF keys by public key
    #[serde(default)]
    keys: BTreeMap<String, String>,
    /// Public key per account and permission level
    #[serde(default)]
    permissions: BTreeMap<String, BTreeMap<PermissionLevel, String>>,
}

impl Wallet {
    /// Create an empty wallet for the main network prefix
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_KEY_PREFIX)
    }

    /// Create an empty wallet indexing public keys with `prefix`
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            keys: BTreeMap::new(),
            permissions: BTreeMap::new(),
        }
    }

    /// Import a WIF key, returning its public key
    pub fn add_key(&mut self, wif: &str) -> Result<String, WalletError> {
        let key = PrivateKey::from_wif(wif)?;
        let public_key = key.public_key().to_string_with_prefix(&self.prefix);
        self.keys.insert(public_key.clone(), key.to_wif());
        Ok(public_key)
    }

    /// Import a WIF key and mark it as `account`'s key for `level`
    pub fn add_account_key(
        &mut self,
        account: &str,
        level: PermissionLevel,
        wif: &str,
    ) -> Result<String, WalletError> {
        let public_key = self.add_key(wif)?;
        self.permissions
            .entry(account.to_string())
            .or_default()
            .insert(level, public_key.clone());
        Ok(public_key)
    }

    /// Public keys held by this wallet
    pub fn public_keys(&self) -> Vec<&str> {
        self.keys.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Save wallet to file
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load wallet from file
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = fs::read_to_string(path)?;
        let wallet: Self = serde_json::from_str(&json)?;
        log::debug!("Loaded {} key(s) from {:?}", wallet.len(), path);
        Ok(wallet)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for Wallet {
    fn key_for_permission(&self, account: &str, level: PermissionLevel) -> Option<String> {
        let public_key = self.permissions.get(account)?.get(&level)?;
        self.private_key_for_public_key(public_key)
    }

    fn private_key_for_public_key(&self, public_key: &str) -> Option<String> {
        self.keys.get(public_key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::tests::key_from_seed;

    #[test]
    fn test_add_key() {
        let key = key_from_seed("alice-active");
        let mut wallet = Wallet::new();

        let public_key = wallet.add_key(&key.to_wif()).unwrap();
        assert_eq!(public_key, key.public_key().to_string());
        assert_eq!(wallet.len(), 1);
        assert_eq!(
            wallet.private_key_for_public_key(&public_key),
            Some(key.to_wif())
        );
        assert_eq!(wallet.private_key_for_public_key("STMunknown"), None);
    }

    #[test]
    fn test_add_key_rejects_bad_wif() {
        let mut wallet = Wallet::new();
        assert!(matches!(
            wallet.add_key("not-a-key"),
            Err(WalletError::CryptoError(_))
        ));
        assert!(wallet.is_empty());
    }

    #[test]
    fn test_key_for_permission() {
        let active = key_from_seed("alice-active");
        let posting = key_from_seed("alice-posting");
        let mut wallet = Wallet::new();
        wallet
            .add_account_key("alice", PermissionLevel::Active, &active.to_wif())
            .unwrap();
        wallet
            .add_account_key("alice", PermissionLevel::Posting, &posting.to_wif())
            .unwrap();

        assert_eq!(
            wallet.key_for_permission("alice", PermissionLevel::Active),
            Some(active.to_wif())
        );
        assert_eq!(
            wallet.key_for_permission("alice", PermissionLevel::Posting),
            Some(posting.to_wif())
        );
        assert_eq!(wallet.key_for_permission("alice", PermissionLevel::Owner), None);
        assert_eq!(wallet.key_for_permission("bob", PermissionLevel::Active), None);
    }

    #[test]
    fn test_wallet_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("wallet.json");

        let key = key_from_seed("bob-owner");
        let mut wallet1 = Wallet::with_prefix("TST");
        wallet1
            .add_account_key("bob", PermissionLevel::Owner, &key.to_wif())
            .unwrap();
        wallet1.save(&path).unwrap();

        let wallet2 = Wallet::load(&path).unwrap();
        assert_eq!(wallet1.public_keys(), wallet2.public_keys());
        assert!(wallet2.public_keys()[0].starts_with("TST"));
        assert_eq!(
            wallet2.key_for_permission("bob", PermissionLevel::Owner),
            Some(key.to_wif())
        );
    }
}
