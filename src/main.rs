// ABOUTME: Entry point for the playvault binary.
// ABOUTME: Loads configuration, opens the store, and runs maintenance subcommands against it.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use playvault_core::AdminConfig;
use playvault_store::{Storage, StoreConfig};

#[derive(Parser)]
#[command(name = "playvault", about = "Maintenance tool for the playvault store")]
struct Cli {
    /// Defaults to `check`.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the store, run a health check and report user counts.
    Check,
    /// Print the assembled admin config as JSON.
    ExportAdmin,
    /// Write an admin config previously produced by `export-admin`.
    ImportAdmin { path: PathBuf },
    /// Delete every row from every table.
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("playvault=info,playvault_store=info")
            }),
        )
        .init();

    let cli = Cli::parse();
    let config = StoreConfig::from_env().context("invalid store configuration")?;
    let storage = Storage::open(&config).context("failed to open store")?;

    match cli.command.unwrap_or(Command::Check) {
        Command::Check => {
            if !storage.health_check().await {
                anyhow::bail!("store at {} failed its health check", storage.path().display());
            }
            let users = storage.user_count().await?;
            tracing::info!("store at {} is healthy ({} users)", storage.path().display(), users);
        }
        Command::ExportAdmin => {
            let admin = storage.read_admin_config().await?;
            println!("{}", serde_json::to_string_pretty(&admin)?);
        }
        Command::ImportAdmin { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let admin: AdminConfig = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a valid admin config", path.display()))?;
            storage.write_admin_config(&admin).await?;
            tracing::info!("imported admin config from {}", path.display());
        }
        Command::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to clear the store without --yes");
            }
            storage.clear_all_data().await?;
        }
    }

    Ok(())
}
