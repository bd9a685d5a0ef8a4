//! Crumb CLI - Schema and admin credential tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the shop tables (idempotent)
//! crumb-cli migrate
//!
//! # Hash an admin password for ADMIN_PASSWORD_HASH
//! crumb-cli admin hash-password
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the shop tables and the session table
//! - `admin hash-password` - Produce an Argon2 PHC string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "crumb-cli")]
#[command(author, version, about = "The Crocheted Crumb CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create database tables if they do not exist
    Migrate,
    /// Manage the admin account
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Hash a password for the `ADMIN_PASSWORD_HASH` variable
    HashPassword {
        /// Password to hash; read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::HashPassword { password } => {
                commands::admin::hash_password(password)?;
            }
        },
    }
    Ok(())
}
