use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Yac - a voting-based consensus node
#[derive(Parser)]
#[command(name = "yac")]
#[command(about = "Yac consensus node and utilities")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a Yac node
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
    },

    /// Generate configuration files for a local network
    Init {
        /// Output directory for the node configurations
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Number of peers
        #[arg(short, long, default_value = "1")]
        peers: usize,

        /// RPC port of the first peer
        #[arg(long, default_value = "8080")]
        base_port: u16,
    },

    /// Generate a new keypair
    Keygen {
        /// Output file for secret key
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show node status
    Status {
        /// RPC endpoint
        #[arg(short, long, default_value = "http://127.0.0.1:8080")]
        endpoint: String,
    },

    /// Sign and submit a transaction
    Tx {
        /// RPC endpoint
        #[arg(short, long, default_value = "http://127.0.0.1:8080")]
        endpoint: String,

        /// Creator secret key hex
        #[arg(long)]
        secret: String,

        /// Transaction nonce
        #[arg(long)]
        nonce: u64,

        /// Payload string
        #[arg(long)]
        payload: String,
    },

    /// Show the answer a node holds for a proposal
    Answer {
        /// RPC endpoint
        #[arg(short, long, default_value = "http://127.0.0.1:8080")]
        endpoint: String,

        /// Proposal hash hex
        proposal_hash: String,
    },
}
