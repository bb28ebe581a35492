//! Pachamama CLI - Storefront client for the Pachamama backend.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! pachamama products list --category superfoods
//! pachamama products categories
//!
//! # Shop
//! pachamama cart add 64f1c2 --quantity 2
//! pachamama cart checkout --name "Ana" --phone 555
//!
//! # Manage products
//! pachamama admin login
//! pachamama products create --name "Maca" --price 18.50 --category Superfoods
//!
//! # Check where a path would land
//! pachamama navigate /admin
//! ```
//!
//! # Commands
//!
//! - `products` - List, show, create, update and delete products
//! - `cart` - Show and change the cart, then check out
//! - `admin` - Log in, check and end the admin session
//! - `navigate` - Resolve a storefront path through the admin guard

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pachamama_storefront::Storefront;
use pachamama_storefront::config::ClientConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod commands;

use commands::CommandError;
use commands::cart::CheckoutArgs;
use commands::products::ProductArgs;

#[derive(Parser)]
#[command(name = "pachamama")]
#[command(author, version, about = "Pachamama storefront client")]
struct Cli {
    /// Backend base URL (overrides `PACHAMAMA_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<Url>,

    /// State file (overrides `PACHAMAMA_STATE_FILE`)
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the admin session
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Resolve a storefront path
    Navigate {
        /// Path such as `/admin` or `/product/64f1c2`
        path: String,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Category, or `all`
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product
    Show { id: String },
    /// List categories
    Categories,
    /// Create a product
    Create(ProductArgs),
    /// Replace a product's fields
    Update {
        id: String,
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Delete a product
    Delete { id: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove { product_id: String },
    /// Empty the cart
    Clear,
    /// Send the order
    Checkout(CheckoutArgs),
}

#[derive(Subcommand)]
enum AdminAction {
    /// Exchange the admin secret for a token
    Login {
        /// Admin secret (defaults to `PACHAMAMA_ADMIN_KEY`)
        #[arg(long)]
        secret: Option<String>,
    },
    /// Check the stored token
    Status,
    /// Forget the stored token
    Logout,
}

/// Initialize Sentry error tracking.
///
/// Returns a guard that must be held for the lifetime of the process.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(Into::into),
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => apply_overrides(config, &cli),
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pachamama=info,pachamama_storefront=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().without_time().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli.command, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn apply_overrides(mut config: ClientConfig, cli: &Cli) -> ClientConfig {
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(state_file) = &cli.state_file {
        config.state_file = state_file.clone();
    }
    config
}

async fn run(command: Commands, config: ClientConfig) -> Result<(), CommandError> {
    let storefront = Storefront::new(config)?;
    let result = dispatch(&storefront, command).await;
    commands::flush_notifications(storefront.notifications());
    result
}

async fn dispatch(storefront: &Storefront, command: Commands) -> Result<(), CommandError> {
    match command {
        Commands::Products { action } => match action {
            ProductAction::List { search, category } => {
                commands::products::list(storefront, search, category).await?;
            }
            ProductAction::Show { id } => commands::products::show(storefront, &id).await?,
            ProductAction::Categories => commands::products::categories(storefront).await,
            ProductAction::Create(product) => commands::products::create(storefront, product).await?,
            ProductAction::Update { id, product } => {
                commands::products::update(storefront, &id, product).await?;
            }
            ProductAction::Delete { id } => commands::products::delete(storefront, &id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(storefront).await?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(storefront, &product_id, quantity).await?,
            CartAction::Remove { product_id } => {
                commands::cart::remove(storefront, &product_id).await?;
            }
            CartAction::Clear => commands::cart::clear(storefront).await?,
            CartAction::Checkout(customer) => commands::cart::checkout(storefront, customer).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Login { secret } => commands::admin::login(storefront, secret).await?,
            AdminAction::Status => commands::admin::status(storefront).await,
            AdminAction::Logout => commands::admin::logout(storefront),
        },
        Commands::Navigate { path } => commands::navigate::navigate(storefront, &path).await,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pachamama_storefront::StorefrontError;

    use super::*;

    #[tokio::test]
    async fn test_unreadable_state_file_is_a_storefront_error() {
        let path = std::env::temp_dir().join(format!("pachamama-cli-{}.json", std::process::id()));
        std::fs::write(&path, "not json").unwrap_or_else(|e| panic!("write state file: {e}"));

        let mut config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap_or_else(|e| panic!("{e}")));
        config.state_file.clone_from(&path);
        let result = run(Commands::Admin { action: AdminAction::Logout }, config).await;
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            result,
            Err(CommandError::Storefront(StorefrontError::Storage(_)))
        ));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_product_create() {
        let cli = Cli::try_parse_from([
            "pachamama",
            "products",
            "create",
            "--name",
            "Maca",
            "--price",
            "18.50",
            "--category",
            "Superfoods",
        ]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_cart_add_defaults_to_one() {
        let Ok(cli) = Cli::try_parse_from(["pachamama", "cart", "add", "p1"]) else {
            panic!("cart add should parse");
        };
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: CartAction::Add { quantity: 1, .. }
            }
        ));
    }
}
