//! Missing-signature resolution against a key store
//!
//! Each multisig participant runs this against their own key store on their
//! own copy of a transaction. Keys they do not hold are skipped, so every
//! participant contributes exactly the signatures they can; the copies are
//! merged afterwards by concatenating signatures.

use crate::core::builder::parse_key_material;
use crate::core::TransactionError;
use crate::crypto::PrivateKey;
use crate::wallet::KeyStore;

/// Looks up private keys for a list of public keys
pub struct SignatureCollector<'a> {
    keystore: &'a dyn KeyStore,
}

impl<'a> SignatureCollector<'a> {
    pub fn new(keystore: &'a dyn KeyStore) -> Self {
        Self { keystore }
    }

    /// Keys held for `missing`, in order, each public key at most once.
    ///
    /// Unknown keys are skipped. A stored key that fails validation aborts
    /// the whole collection with [`TransactionError::InvalidKeyFormat`].
    pub fn collect(&self, missing: &[String]) -> Result<Vec<PrivateKey>, TransactionError> {
        let mut keys: Vec<PrivateKey> = Vec::new();

        for public_key in missing {
            let Some(wif) = self.keystore.private_key_for_public_key(public_key) else {
                log::debug!("no private key held for {}", public_key);
                continue;
            };

            let key = parse_key_material(&wif)?;
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PermissionLevel;
    use crate::crypto::keys::tests::key_from_seed;
    use crate::wallet::Wallet;

    struct CorruptStore;

    impl KeyStore for CorruptStore {
        fn key_for_permission(&self, _account: &str, _level: PermissionLevel) -> Option<String> {
            None
        }

        fn private_key_for_public_key(&self, _public_key: &str) -> Option<String> {
            Some("corrupted".to_string())
        }
    }

    #[test]
    fn test_collects_only_held_keys() {
        let a = key_from_seed("a");
        let b = key_from_seed("b");
        let c = key_from_seed("c");

        let mut wallet = Wallet::new();
        wallet.add_key(&a.to_wif()).unwrap();
        wallet.add_key(&c.to_wif()).unwrap();

        let missing = vec![
            c.public_key().to_string(),
            b.public_key().to_string(),
            a.public_key().to_string(),
        ];
        let keys = SignatureCollector::new(&wallet).collect(&missing).unwrap();
        assert_eq!(keys, vec![c, a]);
    }

    #[test]
    fn test_duplicate_requirements_collected_once() {
        let a = key_from_seed("a");
        let mut wallet = Wallet::new();
        wallet.add_key(&a.to_wif()).unwrap();

        let missing = vec![a.public_key().to_string(), a.public_key().to_string()];
        let keys = SignatureCollector::new(&wallet).collect(&missing).unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_nothing_held() {
        let wallet = Wallet::new();
        let keys = SignatureCollector::new(&wallet)
            .collect(&["STMnobody".to_string()])
            .unwrap();
        assert!(keys.is_empty());
        assert!(SignatureCollector::new(&wallet).collect(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_stored_key() {
        let result = SignatureCollector::new(&CorruptStore).collect(&["STMx".to_string()]);
        assert!(matches!(result, Err(TransactionError::InvalidKeyFormat(_))));
    }
}
