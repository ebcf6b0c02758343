//! CLI commands for offline transaction handling
//!
//! Every command works on transaction records stored as JSON files, so an
//! unsigned transaction can be built on one machine, signed on others, and
//! merged back together.

use crate::chain::{ChainParams, MemoryAccountDirectory, OfflineClient, RefBlock};
use crate::core::{BuilderConfig, PermissionLevel, Services, TransactionBuilder, TransactionRecord};
use crate::wallet::Wallet;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Inputs of the `build` command
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// JSON file with one operation descriptor or an array of them
    pub ops: PathBuf,
    /// JSON array of account records, needed for `--signer`
    pub accounts: Option<PathBuf>,
    /// Account whose authority the transaction needs
    pub signer: Option<String>,
    pub permission: String,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration_secs: i64,
    pub out: Option<PathBuf>,
}

fn read_json(path: &Path) -> CliResult<Value> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn write_json(value: &Value, out: Option<&Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            fs::write(path, json)?;
            println!("💾 Written to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// A lone descriptor starts with its name; anything else is a list
fn operation_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) if matches!(items.first(), Some(Value::String(_))) => {
            vec![Value::Array(items)]
        }
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn offline_services(client: OfflineClient, keystore: Wallet, accounts: MemoryAccountDirectory) -> Services {
    Services {
        chain: Arc::new(client),
        keystore: Arc::new(keystore),
        accounts: Arc::new(accounts),
    }
}

/// Build an unsigned transaction record
pub fn cmd_build(options: &BuildOptions, chain: ChainParams) -> CliResult<()> {
    let level: Option<PermissionLevel> = match options.signer {
        Some(_) => Some(options.permission.parse()?),
        None => None,
    };
    let accounts = match &options.accounts {
        Some(path) => MemoryAccountDirectory::load(path)?,
        None => MemoryAccountDirectory::new(),
    };

    let client = OfflineClient::new(chain).with_ref_block(RefBlock {
        num: options.ref_block_num,
        prefix: options.ref_block_prefix,
    });
    let config = BuilderConfig {
        expiration_secs: options.expiration_secs,
        ..Default::default()
    };
    let mut builder =
        TransactionBuilder::new(offline_services(client, Wallet::new(), accounts), config);

    builder.append_operations(operation_list(read_json(&options.ops)?))?;
    if let (Some(signer), Some(level)) = (&options.signer, level) {
        builder.add_signing_information(signer, level)?;
    }

    println!(
        "🧱 Built transaction with {} operation(s), expires {}",
        builder.operations().len(),
        builder.to_record().expiration
    );
    if let Some(missing) = builder.missing_signatures() {
        println!("   🔑 {} candidate signing key(s)", missing.len());
    }

    write_json(&builder.to_value()?, options.out.as_deref())
}

/// Sign a transaction record with explicit keys and/or a wallet file
pub fn cmd_sign(
    tx: &Path,
    wifs: &[String],
    keystore: Option<&Path>,
    chain: ChainParams,
    out: Option<&Path>,
) -> CliResult<()> {
    let wallet = match keystore {
        Some(path) => Wallet::load(path)?,
        None => Wallet::with_prefix(&chain.prefix),
    };
    let services = offline_services(
        OfflineClient::new(chain),
        wallet,
        MemoryAccountDirectory::new(),
    );
    let mut builder = TransactionBuilder::from_record(read_json(tx)?, services, BuilderConfig::default())?;

    for wif in wifs {
        builder.append_private_key(wif)?;
    }
    if keystore.is_some() {
        let found = builder.append_missing_signatures()?;
        println!("🔑 Found {} key(s) for missing signatures", found);
    }

    let before = builder.signatures().len();
    builder.sign()?;
    println!(
        "✍️  Added {} signature(s), {} total",
        builder.signatures().len() - before,
        builder.signatures().len()
    );

    write_json(&builder.to_value()?, out)
}

/// Merge signatures of several copies of one transaction
pub fn cmd_merge(txs: &[PathBuf], out: Option<&Path>) -> CliResult<()> {
    let (first, rest) = txs
        .split_first()
        .ok_or("at least one transaction file is required")?;

    let mut merged = TransactionRecord::from_value(read_json(first)?)?;
    for path in rest {
        let copy = TransactionRecord::from_value(read_json(path)?)?;
        let added = merged.merge_signatures(&copy)?;
        println!("🔗 {:?}: {} new signature(s)", path, added);
    }

    println!("   Total signatures: {}", merged.signatures.len());
    write_json(&merged.to_value()?, out)
}

/// Show a transaction record and who has signed it
pub fn cmd_inspect(tx: &Path, chain: ChainParams) -> CliResult<()> {
    let record = TransactionRecord::from_value(read_json(tx)?)?;
    let chain = record.blockchain.clone().unwrap_or(chain);
    let body = record.transaction();

    println!("📄 Transaction {}", body.id()?);
    println!("   ├─ Digest: {}", hex::encode(body.digest(&chain)?));
    println!(
        "   ├─ Ref block: {} / {}",
        record.ref_block_num, record.ref_block_prefix
    );
    println!("   ├─ Expiration: {}", record.expiration);
    println!("   └─ Operations: {}", record.operations.len());
    for op in &record.operations {
        println!("      • {}", op.name());
    }

    let signers: Vec<String> = record
        .recover_signers(&chain)?
        .iter()
        .map(|key| key.to_string_with_prefix(&chain.prefix))
        .collect();
    println!("\n✍️  Signatures: {}", signers.len());
    for signer in &signers {
        println!("   • {}", signer);
    }

    if let Some(missing) = &record.missing_signatures {
        println!("\n🔑 Candidate keys: {}", missing.len());
        for key in missing {
            let mark = if signers.contains(key) { "✅" } else { "⏳" };
            println!("   {} {}", mark, key);
        }
    }

    Ok(())
}
