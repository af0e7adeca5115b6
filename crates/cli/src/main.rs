//! Parfum CLI - drive the storefront core from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add a bottle to the cart and show the cart
//! parfum cart add --product aventus --variant bottle --name Aventus --price 4500000
//! parfum cart show
//!
//! # List the first two pages of fresh scents, cheapest first
//! parfum catalog list --catalog catalog.json --category Fresh --sort price-asc --pages 2
//!
//! # Preview the order the current cart would produce
//! parfum checkout draft --user-id u1 --email rina@example.com --name Rina \
//!     --phone 08123456789 --address "Jl. Merdeka 10" --city Bandung --postal-code 40111
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and edit the persisted cart
//! - `catalog list` - Page through a JSON catalog fixture
//! - `checkout draft` - Build an order draft from the cart without submitting it
//!
//! Configuration comes from the environment (see `parfum_storefront::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CartAction, CatalogAction, CheckoutAction};

#[derive(Parser)]
#[command(name = "parfum")]
#[command(author, version, about = "Parfum storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Checkout
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output can be piped
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "parfum_storefront=info,parfum_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let config = parfum_storefront::StorefrontConfig::from_env()?;

    match cli.command {
        Commands::Cart { action } => commands::cart::run(&config, action)?,
        Commands::Catalog { action } => commands::catalog::run(&config, action).await?,
        Commands::Checkout { action } => commands::checkout::run(&config, action)?,
    }
    Ok(())
}
