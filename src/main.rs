//! Steem transaction builder CLI
//!
//! Builds, signs, merges and inspects transaction records offline.

use clap::{Parser, Subcommand};
use steem_txbuilder::chain::{ChainParams, STEEM_CHAIN_ID};
use steem_txbuilder::cli::{self, BuildOptions};
use steem_txbuilder::core::DEFAULT_EXPIRATION_SECS;
use steem_txbuilder::crypto::DEFAULT_KEY_PREFIX;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "txbuilder")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Build and sign Steem transactions offline", long_about = None)]
struct Cli {
    /// Chain id used in signing digests (hex)
    #[arg(long, default_value = STEEM_CHAIN_ID)]
    chain_id: String,

    /// Public key prefix
    #[arg(long, default_value = DEFAULT_KEY_PREFIX)]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an unsigned transaction from operation descriptors
    Build {
        /// JSON file with one operation or an array of operations
        #[arg(long)]
        ops: PathBuf,

        /// Reference block number (low 16 bits of the block height)
        #[arg(long)]
        ref_block_num: u16,

        /// Reference block prefix
        #[arg(long)]
        ref_block_prefix: u32,

        /// Seconds until the transaction expires
        #[arg(long, default_value_t = DEFAULT_EXPIRATION_SECS)]
        expiration: i64,

        /// JSON file with account records, required with --signer
        #[arg(long)]
        accounts: Option<PathBuf>,

        /// Account whose authority must sign
        #[arg(long, requires = "accounts")]
        signer: Option<String>,

        /// Permission level of the signer (owner, active, posting)
        #[arg(long, default_value = "active")]
        permission: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Add signatures to a transaction
    Sign {
        /// Transaction record file
        #[arg(long)]
        tx: PathBuf,

        /// WIF private key (repeatable)
        #[arg(long)]
        wif: Vec<String>,

        /// Wallet file used to resolve missing signatures
        #[arg(long)]
        keystore: Option<PathBuf>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Merge signatures from copies of one transaction
    Merge {
        /// Transaction record files (repeatable)
        #[arg(long, required = true)]
        tx: Vec<PathBuf>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show a transaction and its signers
    Inspect {
        /// Transaction record file
        #[arg(long)]
        tx: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let chain = ChainParams::new(&cli.chain_id, &cli.prefix);
    chain.chain_id_bytes()?;

    match cli.command {
        Commands::Build {
            ops,
            ref_block_num,
            ref_block_prefix,
            expiration,
            accounts,
            signer,
            permission,
            out,
        } => {
            let options = BuildOptions {
                ops,
                accounts,
                signer,
                permission,
                ref_block_num,
                ref_block_prefix,
                expiration_secs: expiration,
                out,
            };
            cli::cmd_build(&options, chain)?;
        }

        Commands::Sign {
            tx,
            wif,
            keystore,
            out,
        } => {
            cli::cmd_sign(&tx, &wif, keystore.as_deref(), chain, out.as_deref())?;
        }

        Commands::Merge { tx, out } => {
            cli::cmd_merge(&tx, out.as_deref())?;
        }

        Commands::Inspect { tx } => {
            cli::cmd_inspect(&tx, chain)?;
        }
    }

    Ok(())
}
