//! rackvm-instance: command-line host for the instance lifecycle controller.
//!
//! Each subcommand runs one lifecycle operation and prints the resulting
//! state as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rackvm_client::{ClientConfig, HttpClient};
use rackvm_instance::config::load_state;
use rackvm_instance::{InstanceConfig, InstanceController, Lifecycle, ResourceState};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// rackvm instance controller
#[derive(Parser, Debug)]
#[command(name = "rackvm-instance", version, about)]
struct Args {
    /// Control plane base URL (e.g., https://rack.example.com)
    #[arg(long, env = "RACKVM_HOST")]
    host: String,

    /// API token
    #[arg(long, env = "RACKVM_TOKEN", hide_env_values = true)]
    token: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an instance from a configuration file
    Create {
        /// Instance configuration (JSON)
        #[arg(long)]
        config: PathBuf,
    },
    /// Refresh a recorded instance state
    Read {
        /// State file written by a previous create or read
        #[arg(long)]
        state: PathBuf,
    },
    /// Update an instance (not supported by the control plane)
    Update {
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        config: PathBuf,
    },
    /// Delete a recorded instance
    Delete {
        #[arg(long)]
        state: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rackvm_instance=info,rackvm_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let client = HttpClient::new(ClientConfig::new(args.host, args.token))
        .context("Failed to build control plane client")?;
    info!("Control plane: {}", client.base_url());
    let controller = InstanceController::new(Arc::new(client));

    match args.command {
        Command::Create { config } => {
            let spec = InstanceConfig::load(&config).await?.into_spec();
            let budget = spec.timeouts.budget()?;
            let state = controller
                .create(&spec, &budget)
                .await
                .with_context(|| format!("Failed to create instance {}", spec.name))?;
            print_state(&state)?;
        }
        Command::Read { state } => {
            let recorded = load_state(&state).await?;
            let budget = recorded.timeouts.budget()?;
            let refreshed = controller
                .read(&recorded, &budget)
                .await
                .with_context(|| format!("Failed to read instance {}", recorded.id))?;
            print_state(&refreshed)?;
        }
        Command::Update { state, config } => {
            let recorded = load_state(&state).await?;
            let spec = InstanceConfig::load(&config).await?.into_spec();
            let budget = spec.timeouts.budget()?;
            let updated = controller
                .update(&recorded, &spec, &budget)
                .await
                .with_context(|| format!("Failed to update instance {}", recorded.id))?;
            print_state(&updated)?;
        }
        Command::Delete { state } => {
            let recorded = load_state(&state).await?;
            let budget = recorded.timeouts.budget()?;
            controller
                .delete(&recorded, &budget)
                .await
                .with_context(|| format!("Failed to delete instance {}", recorded.id))?;
        }
    }

    Ok(())
}

fn print_state(state: &ResourceState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;
    println!("{}", json);
    Ok(())
}
