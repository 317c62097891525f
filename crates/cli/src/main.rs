//! Canteen CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! canteen-cli migrate
//!
//! # Grant or revoke the admin role
//! canteen-cli user promote -e chef@example.com
//! canteen-cli user demote -e chef@example.com
//!
//! # List users with their roles
//! canteen-cli user list
//!
//! # Load products from a YAML file
//! canteen-cli seed menu -f menu.yaml --replace
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "canteen-cli")]
#[command(author, version, about = "Canteen CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Give a user the admin role
    Promote {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// Return a user to the customer role
    Demote {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// List users and their roles
    List,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load menu products from a YAML file
    Menu {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,

        /// Delete existing products (and the cart lines holding them) first
        #[arg(long)]
        replace: bool,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::User { action } => match action {
            UserAction::Promote { email } => {
                commands::user::set_role(&email, canteen_core::Role::Admin).await?;
            }
            UserAction::Demote { email } => {
                commands::user::set_role(&email, canteen_core::Role::Customer).await?;
            }
            UserAction::List => commands::user::list().await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Menu { file, replace } => commands::seed::menu(&file, replace).await?,
        },
    }
    Ok(())
}
