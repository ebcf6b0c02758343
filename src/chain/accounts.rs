//! Account records and their lookup
//!
//! An account carries one [`Authority`] per permission level. Where the
//! records come from (node RPC, cache, fixture file) is up to the
//! [`AccountDirectory`] implementation.

use crate::chain::ChainError;
use crate::core::{Authority, PermissionLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Account record with its per-level authorities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub owner: Authority,
    pub active: Authority,
    pub posting: Authority,
    #[serde(default)]
    pub memo_key: String,
}

impl Account {
    /// Authority for a permission level
    pub fn authority(&self, level: PermissionLevel) -> &Authority {
        match level {
            PermissionLevel::Owner => &self.owner,
            PermissionLevel::Active => &self.active,
            PermissionLevel::Posting => &self.posting,
        }
    }
}

/// Lookup of account records by name
pub trait AccountDirectory: Send + Sync {
    /// Fetch an account, failing with [`ChainError::AccountNotFound`] if unknown
    fn lookup(&self, name: &str) -> Result<Account, ChainError>;
}

/// In-memory account directory
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountDirectory {
    accounts: BTreeMap<String, Account>,
}

impl MemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account
    pub fn insert(&mut self, account: Account) {
        self.accounts.insert(account.name.clone(), account);
    }

    /// Load a JSON array of account records
    pub fn load(path: &Path) -> Result<Self, crate::wallet::WalletError> {
        let json = fs::read_to_string(path)?;
        let accounts: Vec<Account> = serde_json::from_str(&json)?;

        let mut directory = Self::new();
        for account in accounts {
            directory.insert(account);
        }
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountDirectory for MemoryAccountDirectory {
    fn lookup(&self, name: &str) -> Result<Account, ChainError> {
        self.accounts
            .get(name)
            .cloned()
            .ok_or_else(|| ChainError::AccountNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> Account {
        Account {
            name: name.to_string(),
            owner: Authority::single_key("STMowner"),
            active: Authority::single_key("STMactive"),
            posting: Authority::single_key("STMposting"),
            memo_key: String::new(),
        }
    }

    #[test]
    fn test_authority_by_level() {
        let acc = account("alice");
        assert_eq!(acc.authority(PermissionLevel::Owner).key_auth_keys(), vec!["STMowner"]);
        assert_eq!(acc.authority(PermissionLevel::Active).key_auth_keys(), vec!["STMactive"]);
        assert_eq!(acc.authority(PermissionLevel::Posting).key_auth_keys(), vec!["STMposting"]);
    }

    #[test]
    fn test_lookup() {
        let mut directory = MemoryAccountDirectory::new();
        directory.insert(account("alice"));

        assert_eq!(directory.lookup("alice").unwrap().name, "alice");
        assert_eq!(
            directory.lookup("mallory"),
            Err(ChainError::AccountNotFound("mallory".to_string()))
        );
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("accounts.json");
        let json = serde_json::to_string(&vec![account("alice"), account("bob")]).unwrap();
        fs::write(&path, json).unwrap();

        let directory = MemoryAccountDirectory::load(&path).unwrap();
        assert_eq!(directory.len(), 2);
        assert!(directory.lookup("bob").is_ok());
    }
}
