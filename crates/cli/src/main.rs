//! Tea shop CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! teashop migrate
//!
//! # Insert default categories, sample products and the guest account
//! teashop seed
//!
//! # Give an account manager rights
//! teashop manager promote -e owner@example.com
//!
//! # Remove expired verification codes
//! teashop codes cleanup
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "teashop")]
#[command(author, version, about = "Tea shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed default categories, sample products and the guest account
    Seed,
    /// Manage manager accounts
    Manager {
        #[command(subcommand)]
        action: ManagerAction,
    },
    /// Verification code maintenance
    Codes {
        #[command(subcommand)]
        action: CodesAction,
    },
}

#[derive(Subcommand)]
enum ManagerAction {
    /// Grant manager rights, creating the account if needed
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum CodesAction {
    /// Delete expired verification codes
    Cleanup,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Manager { action } => match action {
            ManagerAction::Promote { email } => commands::manager::promote(&email).await?,
        },
        Commands::Codes { action } => match action {
            CodesAction::Cleanup => {
                commands::codes::cleanup().await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
