//! Keystall CLI - migrations and back-office chores.
//!
//! # Usage
//!
//! ```bash
//! # Apply SQL migrations
//! keystall migrate
//!
//! # Create the first super admin
//! keystall admin create -e owner@example.com -n "Owner" -r super_admin -p 'long passphrase'
//!
//! # Give an existing customer admin access
//! keystall admin promote -e helper@example.com -r moderator
//!
//! # Expire available stock keys past their expiry (run from cron)
//! keystall stock expire
//!
//! # Load a demo catalog
//! keystall seed catalog demos/catalog.yaml
//! ```
//!
//! Every command reads `ADMIN_DATABASE_URL`, falling back to `DATABASE_URL`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keystall_core::AdminRole;

mod commands;

#[derive(Parser)]
#[command(name = "keystall")]
#[command(author, version, about = "Keystall CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Manage admin access
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Stock key maintenance
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
    /// Load data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new profile with admin access
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`super_admin`, `admin`, `moderator`)
        #[arg(short, long, default_value = "admin")]
        role: AdminRole,

        /// Login password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
    /// Give an existing profile admin access
    Promote {
        /// Email of the existing profile
        #[arg(short, long)]
        email: String,

        /// Role (`super_admin`, `admin`, `moderator`)
        #[arg(short, long, default_value = "admin")]
        role: AdminRole,
    },
}

#[derive(Subcommand)]
enum StockAction {
    /// Mark available keys past their expiry as expired
    Expire,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load products, variants, stock keys and banners from YAML
    Catalog {
        /// Path to the YAML file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create(email, name, role, password).await?;
            }
            AdminAction::Promote { email, role } => {
                commands::admin::promote(email, role).await?;
            }
        },
        Commands::Stock { action } => match action {
            StockAction::Expire => commands::stock::expire().await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
    }
    Ok(())
}
