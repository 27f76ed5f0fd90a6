//! Marketstall CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! ms-cli migrate
//!
//! # Create an account (password read from MARKETSTALL_NEW_USER_PASSWORD)
//! ms-cli user create -u shopkeeper -e shop@example.com -r Retailer
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create a Customer or Retailer account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ms-cli")]
#[command(author, version, about = "Marketstall CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address (order confirmations go here)
        #[arg(short, long)]
        email: String,

        /// Account role (`Customer` or `Retailer`)
        #[arg(short, long, default_value = "Customer")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

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
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                role,
            } => {
                commands::user::create(&username, &email, &role).await?;
            }
        },
    }
    Ok(())
}
