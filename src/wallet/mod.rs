//! Wallet module for private key storage

pub mod wallet;

pub use wallet::{KeyStore, Wallet, WalletError};
