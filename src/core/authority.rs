//! Permission levels, authorities, and signer resolution
//!
//! An account's authority for a level is a weighted set of keys plus a
//! weighted set of delegated accounts. [`AuthorityResolver`] flattens that
//! into the list of public keys whose signatures may be needed. Delegation
//! is followed exactly one level deep and no weight arithmetic is done:
//! the result is a candidate list, not a minimal sufficient set.

use crate::chain::AccountDirectory;
use crate::core::TransactionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Permission levels, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Posting,
    Active,
    Owner,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Posting => "posting",
            PermissionLevel::Active => "active",
            PermissionLevel::Owner => "owner",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posting" => Ok(PermissionLevel::Posting),
            "active" => Ok(PermissionLevel::Active),
            "owner" => Ok(PermissionLevel::Owner),
            other => Err(TransactionError::InvalidPermissionLevel(other.to_string())),
        }
    }
}

/// Access-control requirement of one permission level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    #[serde(default)]
    pub weight_threshold: u32,
    #[serde(default)]
    pub account_auths: Vec<(String, u16)>,
    #[serde(default)]
    pub key_auths: Vec<(String, u16)>,
}

impl Authority {
    /// Threshold-1 authority satisfied by one key
    pub fn single_key(public_key: &str) -> Self {
        Self {
            weight_threshold: 1,
            account_auths: Vec::new(),
            key_auths: vec![(public_key.to_string(), 1)],
        }
    }

    /// Public keys in `key_auths` order
    pub fn key_auth_keys(&self) -> Vec<&str> {
        self.key_auths.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Delegated account names in `account_auths` order
    pub fn delegated_accounts(&self) -> Vec<&str> {
        self.account_auths
            .iter()
            .map(|(account, _)| account.as_str())
            .collect()
    }
}

/// Flattened signer requirement for one account and level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAuthorities {
    /// Authority snapshot of the target and each directly delegated account
    pub required: BTreeMap<String, Authority>,
    /// Target keys followed by each delegate's keys; duplicates kept
    pub missing: Vec<String>,
}

/// Resolves which keys may need to sign for an account
pub struct AuthorityResolver<'a> {
    directory: &'a dyn AccountDirectory,
}

impl<'a> AuthorityResolver<'a> {
    pub fn new(directory: &'a dyn AccountDirectory) -> Self {
        Self { directory }
    }

    /// Resolve `account`'s authority at `level`, following delegations one level deep
    pub fn resolve(
        &self,
        account: &str,
        level: PermissionLevel,
    ) -> Result<ResolvedAuthorities, TransactionError> {
        let target = self.directory.lookup(account)?;
        let authority = target.authority(level).clone();

        let mut resolved = ResolvedAuthorities::default();
        resolved
            .required
            .insert(account.to_string(), authority.clone());
        resolved
            .missing
            .extend(authority.key_auth_keys().into_iter().map(String::from));

        for delegate in authority.delegated_accounts() {
            let delegated = self.directory.lookup(delegate)?;
            let delegated_authority = delegated.authority(level).clone();
            resolved
                .missing
                .extend(delegated_authority.key_auth_keys().into_iter().map(String::from));
            resolved
                .required
                .insert(delegate.to_string(), delegated_authority);
        }

        log::debug!(
            "{}@{}: {} authorities, {} candidate keys",
            account,
            level,
            resolved.required.len(),
            resolved.missing.len()
        );

        Ok(resolved)
    }
}
