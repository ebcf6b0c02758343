//! Key material for transaction signing
//!
//! Private keys travel as WIF strings (Base58Check with a 0x80 version
//! byte), public keys as `<prefix><base58(key || ripemd160 checksum)>`.
//! Signatures are 65-byte compact recoverable secp256k1 signatures that
//! the chain accepts only in canonical form.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, SecretKey};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::{double_sha256, ripemd160_checksum, sha256};

/// Address prefix used by the main network
pub const DEFAULT_KEY_PREFIX: &str = "STM";

/// Version byte prepended to the secret in the WIF encoding
const WIF_VERSION: u8 = 0x80;

/// Recovery header offset for signatures over compressed keys
const COMPACT_HEADER_OFFSET: u8 = 27 + 4;

/// Length of a serialized compact recoverable signature
pub const SIGNATURE_LENGTH: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid WIF: {0}")]
    InvalidWif(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A secp256k1 private key
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    secret_key: SecretKey,
}

impl PrivateKey {
    /// Build a key from 32 raw secret bytes
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self { secret_key })
    }

    /// Decode a WIF string, checking version byte and checksum
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        let raw = bs58::decode(wif.trim())
            .into_vec()
            .map_err(|e| KeyError::InvalidWif(e.to_string()))?;

        if raw.len() != 37 {
            return Err(KeyError::InvalidWif(format!(
                "expected 37 decoded bytes, got {}",
                raw.len()
            )));
        }

        let (payload, checksum) = raw.split_at(33);
        if payload[0] != WIF_VERSION {
            return Err(KeyError::InvalidWif(format!(
                "unexpected version byte 0x{:02x}",
                payload[0]
            )));
        }
        if double_sha256(payload)[..4] != *checksum {
            return Err(KeyError::InvalidWif("checksum mismatch".to_string()));
        }

        Self::from_secret_bytes(&payload[1..])
    }

    /// Encode as WIF
    pub fn to_wif(&self) -> String {
        let mut payload = vec![WIF_VERSION];
        payload.extend_from_slice(&self.secret_key.secret_bytes());
        let checksum = double_sha256(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    /// Derive the matching public key
    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::signing_only();
        PublicKey {
            key: secp256k1::PublicKey::from_secret_key(&secp, &self.secret_key),
        }
    }

    /// Produce a canonical 65-byte recoverable signature over a 32-byte digest.
    ///
    /// RFC6979 nonces are deterministic, so non-canonical results are
    /// retried with extra nonce data derived from the digest and attempt.
    pub fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>, KeyError> {
        let secp = Secp256k1::signing_only();
        let message = Message::from_digest_slice(digest)?;

        let mut attempt: u32 = 0;
        loop {
            let signature = if attempt == 0 {
                secp.sign_ecdsa_recoverable(&message, &self.secret_key)
            } else {
                let mut data = digest.to_vec();
                data.extend_from_slice(&attempt.to_le_bytes());
                let mut nonce = [0u8; 32];
                nonce.copy_from_slice(&sha256(&data));
                secp.sign_ecdsa_recoverable_with_noncedata(&message, &self.secret_key, &nonce)
            };

            let (recovery_id, compact) = signature.serialize_compact();
            if is_canonical(&compact) {
                let mut out = Vec::with_capacity(SIGNATURE_LENGTH);
                out.push(COMPACT_HEADER_OFFSET + recovery_id.to_i32() as u8);
                out.extend_from_slice(&compact);
                return Ok(out);
            }

            log::debug!("non-canonical signature on attempt {}, retrying", attempt);
            attempt += 1;
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key().to_string())
            .finish()
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wif(s)
    }
}

/// A compressed secp256k1 public key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey {
    key: secp256k1::PublicKey,
}

impl PublicKey {
    /// Parse `<prefix><base58>` with an explicit prefix
    pub fn from_str_with_prefix(s: &str, prefix: &str) -> Result<Self, KeyError> {
        let encoded = s
            .strip_prefix(prefix)
            .ok_or_else(|| KeyError::InvalidPublicKey(format!("missing prefix {}", prefix)))?;

        let raw = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        if raw.len() != 37 {
            return Err(KeyError::InvalidPublicKey(format!(
                "expected 37 decoded bytes, got {}",
                raw.len()
            )));
        }

        let (key_bytes, checksum) = raw.split_at(33);
        if ripemd160_checksum(key_bytes) != *checksum {
            return Err(KeyError::InvalidPublicKey("checksum mismatch".to_string()));
        }

        let key = secp256k1::PublicKey::from_slice(key_bytes)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Format with an explicit prefix
    pub fn to_string_with_prefix(&self, prefix: &str) -> String {
        let key_bytes = self.key.serialize();
        let mut raw = key_bytes.to_vec();
        raw.extend_from_slice(&ripemd160_checksum(&key_bytes));
        format!("{}{}", prefix, bs58::encode(raw).into_string())
    }

    /// Compressed SEC1 bytes
    pub fn serialize(&self) -> [u8; 33] {
        self.key.serialize()
    }

    /// Recover the signer of a 65-byte compact signature
    pub fn recover(digest: &[u8], signature: &[u8]) -> Result<Self, KeyError> {
        if signature.len() != SIGNATURE_LENGTH {
            return Err(KeyError::InvalidSignature);
        }

        let header = signature[0];
        let recovery = match header {
            31..=34 => header - COMPACT_HEADER_OFFSET,
            27..=30 => header - 27,
            _ => return Err(KeyError::InvalidSignature),
        };
        let recovery_id =
            RecoveryId::from_i32(recovery as i32).map_err(|_| KeyError::InvalidSignature)?;
        let signature = RecoverableSignature::from_compact(&signature[1..], recovery_id)
            .map_err(|_| KeyError::InvalidSignature)?;

        let secp = Secp256k1::verification_only();
        let message = Message::from_digest_slice(digest)?;
        let key = secp.recover_ecdsa(&message, &signature)?;
        Ok(Self { key })
    }

    /// Check that `signature` over `digest` was produced by this key
    pub fn verify(&self, digest: &[u8], signature: &[u8]) -> bool {
        matches!(Self::recover(digest, signature), Ok(signer) if signer == *self)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with_prefix(DEFAULT_KEY_PREFIX))
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_with_prefix(s, DEFAULT_KEY_PREFIX)
    }
}

/// Canonical form required by the chain: neither r nor s may carry a
/// high bit or an unnecessary leading zero byte.
fn is_canonical(compact: &[u8; 64]) -> bool {
    compact[0] & 0x80 == 0
        && !(compact[0] == 0 && compact[1] & 0x80 == 0)
        && compact[32] & 0x80 == 0
        && !(compact[32] == 0 && compact[33] & 0x80 == 0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Deterministic test key derived from a seed phrase
    pub(crate) fn key_from_seed(seed: &str) -> PrivateKey {
        PrivateKey::from_secret_bytes(&sha256(seed.as_bytes())).unwrap()
    }

    #[test]
    fn test_wif_decoding_known_vector() {
        let key = PrivateKey::from_wif("5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ")
            .unwrap();
        assert_eq!(
            hex::encode(key.secret_key.secret_bytes()),
            "0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d"
        );
        assert_eq!(
            key.to_wif(),
            "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ"
        );
    }

    #[test]
    fn test_wif_rejects_garbage() {
        assert!(matches!(
            PrivateKey::from_wif("not-a-key"),
            Err(KeyError::InvalidWif(_))
        ));

        // Flip the last character so the checksum no longer matches
        let mut wif = key_from_seed("alice").to_wif();
        let last = wif.pop().unwrap();
        wif.push(if last == 'a' { 'b' } else { 'a' });
        assert!(PrivateKey::from_wif(&wif).is_err());
    }

    #[test]
    fn test_public_key_text_form() {
        let key = key_from_seed("alice").public_key();
        let text = key.to_string();
        assert!(text.starts_with("STM"));

        let parsed: PublicKey = text.parse().unwrap();
        assert_eq!(parsed, key);

        let testnet = key.to_string_with_prefix("TST");
        assert!(PublicKey::from_str_with_prefix(&testnet, "TST").is_ok());
        assert!(testnet.parse::<PublicKey>().is_err());
    }

    #[test]
    fn test_sign_and_recover() {
        let key = key_from_seed("bob");
        let digest = sha256(b"transfer 1.000 STEEM");

        let signature = key.sign_digest(&digest).unwrap();
        assert_eq!(signature.len(), SIGNATURE_LENGTH);
        assert!((31..=34).contains(&signature[0]));

        let mut compact = [0u8; 64];
        compact.copy_from_slice(&signature[1..]);
        assert!(is_canonical(&compact));

        assert_eq!(PublicKey::recover(&digest, &signature).unwrap(), key.public_key());
        assert!(key.public_key().verify(&digest, &signature));
        assert!(!key_from_seed("carol").public_key().verify(&digest, &signature));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key = key_from_seed("dave");
        let digest = sha256(b"vote");
        assert_eq!(key.sign_digest(&digest).unwrap(), key.sign_digest(&digest).unwrap());
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let key = key_from_seed("erin");
        let debug = format!("{:?}", key);
        assert!(!debug.contains(&key.to_wif()));
    }
}
