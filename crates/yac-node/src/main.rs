use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use yac_core::{KeyPair, SecretKey, Transaction};

mod cli;
mod config;
mod node;

use cli::{Cli, Commands};
use config::{generate_local_network, NodeConfig};
use node::Node;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            run_node(&config).await?;
        }
        Commands::Init {
            output,
            peers,
            base_port,
        } => {
            init_network(output, peers, base_port)?;
        }
        Commands::Keygen { output } => {
            generate_keypair(output)?;
        }
        Commands::Status { endpoint } => {
            get_json(&format!("{}/status", endpoint), "Node Status").await?;
        }
        Commands::Tx {
            endpoint,
            secret,
            nonce,
            payload,
        } => {
            submit_transaction(&endpoint, &secret, nonce, payload).await?;
        }
        Commands::Answer {
            endpoint,
            proposal_hash,
        } => {
            get_json(&format!("{}/yac/answer/{}", endpoint, proposal_hash), "Answer").await?;
        }
    }

    Ok(())
}

/// Run a Yac node
async fn run_node(config_path: &Path) -> Result<()> {
    info!("Loading configuration from {:?}", config_path);

    if !config_path.exists() {
        error!(
            "Configuration file not found: {:?}. Run 'yac init' to create one.",
            config_path
        );
        bail!("Configuration file not found");
    }
    let config = NodeConfig::load(config_path)?;

    let node = Node::new(config)?;
    node.run().await?;

    Ok(())
}

/// Write one configuration file per local peer
fn init_network(output: PathBuf, peers: usize, base_port: u16) -> Result<()> {
    if peers == 0 {
        bail!("A network needs at least one peer");
    }

    std::fs::create_dir_all(&output)?;
    let configs = generate_local_network(peers, base_port);
    for (i, config) in configs.iter().enumerate() {
        let path = output.join(format!("node{}.json", i));
        config.save(&path)?;
        println!("Configuration file created: {}", path.display());
    }

    println!("\nTo start the first node, run:");
    println!("  yac run --config {}", output.join("node0.json").display());

    Ok(())
}

/// Generate a new keypair
fn generate_keypair(output: Option<PathBuf>) -> Result<()> {
    let keypair = KeyPair::generate();

    println!("Generated new keypair:");
    println!("  Public key:  {}", keypair.public.to_hex());
    println!("  Secret key:  {}", keypair.secret.to_hex());

    if let Some(path) = output {
        std::fs::write(&path, keypair.secret.to_hex())?;
        info!("Secret key saved to {:?}", path);
    }

    println!("\nWARNING: Keep your secret key safe! Do not share it with anyone.");

    Ok(())
}

async fn get_json(url: &str, title: &str) -> Result<()> {
    let response = reqwest::get(url).await?;
    let status = response.status();
    let body: serde_json::Value = response.json().await?;

    if status.is_success() {
        println!("{}:", title);
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        error!("Request failed with {}", status);
        println!("{}", serde_json::to_string_pretty(&body)?);
    }

    Ok(())
}

/// Sign and submit a transaction
async fn submit_transaction(endpoint: &str, secret: &str, nonce: u64, payload: String) -> Result<()> {
    let creator = KeyPair::from_secret(SecretKey::from_hex(secret)?);
    let tx = Transaction::new_signed(creator.public, nonce, payload.into_bytes(), &creator.secret)?;

    let url = format!("{}/tx", endpoint);

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(&serde_json::json!({ "transaction": tx }))
        .send()
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    if status.is_success() {
        println!("Transaction submitted:");
    } else {
        error!("Failed to submit transaction:");
    }
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}
