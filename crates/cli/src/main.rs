//! Aurum CLI - Storefront client for the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add two units of a product to the cart
//! aurum cart add kundan-choker -q 2
//!
//! # Show the cart with totals
//! aurum cart show
//!
//! # Sign in, then save a product to the wishlist
//! aurum login -e meera@example.com
//! aurum wishlist toggle kundan-choker
//!
//! # Browse gold rings, cheapest first
//! aurum products --category rings --metal gold --sort price-ascending
//! ```
//!
//! Local state (cart, auth token) lives in `AURUM_DATA_DIR`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, Write};
use std::process::ExitCode;

use aurum_storefront::Storefront;
use aurum_storefront::config::StorefrontConfig;
use aurum_storefront::notify::NotificationQueue;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{App, CommandError};

#[derive(Parser)]
#[command(name = "aurum")]
#[command(author, version, about = "Aurum storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
    /// Manage the wishlist (requires login)
    Wishlist {
        #[command(subcommand)]
        action: WishlistCommand,
    },
    /// Sign in to your account
    Login {
        /// Account email address
        #[arg(short, long, env = "AURUM_EMAIL")]
        email: String,

        /// Account password
        #[arg(short, long, env = "AURUM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out (the cart is kept)
    Logout,
    /// Browse the catalog
    Products(commands::catalog::ProductArgs),
    /// Show order history
    Orders,
    /// Manage saved addresses
    Addresses {
        #[command(subcommand)]
        action: Option<AddressCommand>,
    },
    /// Show cashback offers and the best one for an order total
    Offers {
        /// Order total to evaluate (defaults to the cart total)
        #[arg(short, long)]
        total: Option<Decimal>,
    },
}

#[derive(Subcommand)]
enum CartCommand {
    /// Add a product by slug
    Add {
        /// Product slug
        slug: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line by product id or slug
    Remove { product: String },
    /// Set a line's quantity (0 or less removes it)
    Set {
        product: String,

        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
    /// List cart lines and totals
    Show,
}

#[derive(Subcommand)]
enum WishlistCommand {
    /// Save or unsave a product by id or slug
    Toggle { product: String },
    /// List saved products
    List,
}

#[derive(Subcommand)]
enum AddressCommand {
    /// List saved addresses
    List,
    /// Save a new address
    Add(commands::account::AddressArgs),
    /// Delete a saved address
    Delete { id: i64 },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
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
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr; stdout is reserved for command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aurum_storefront=info,aurum=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let notifications = NotificationQueue::new();
    let mut app: App = match Storefront::open(&config, notifications.clone()) {
        Ok(app) => app,
        Err(e) => {
            e.report();
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout().lock();
    let result = run(cli.command, &mut app, &mut stdout).await;

    // Toasts are shown whether or not the command succeeded
    let shown = commands::print_notifications(&mut stdout, &notifications.drain());

    match result.and(shown.map_err(CommandError::from)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            let _ = writeln!(io::stderr(), "error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, app: &mut App, out: &mut impl Write) -> Result<(), CommandError> {
    match command {
        Commands::Cart { action } => match action {
            CartCommand::Add { slug, quantity } => {
                commands::cart::add(app, &slug, quantity).await?;
            }
            CartCommand::Remove { product } => commands::cart::remove(app, &product)?,
            CartCommand::Set { product, quantity } => {
                commands::cart::set_quantity(app, &product, quantity)?;
            }
            CartCommand::Clear => commands::cart::clear(app)?,
            CartCommand::Show => commands::cart::show(app, out)?,
        },
        Commands::Wishlist { action } => match action {
            WishlistCommand::Toggle { product } => commands::wishlist::toggle(app, &product).await?,
            WishlistCommand::List => commands::wishlist::list(app, out).await?,
        },
        Commands::Login { email, password } => {
            commands::account::login(app, &email, password, out).await?;
        }
        Commands::Logout => commands::account::logout(app)?,
        Commands::Products(args) => commands::catalog::products(app, &args, out).await?,
        Commands::Orders => commands::account::orders(app, out).await?,
        Commands::Addresses { action } => match action.unwrap_or(AddressCommand::List) {
            AddressCommand::List => commands::account::addresses(app, out).await?,
            AddressCommand::Add(args) => commands::account::add_address(app, args, out).await?,
            AddressCommand::Delete { id } => commands::account::delete_address(app, id).await?,
        },
        Commands::Offers { total } => commands::catalog::offers(app, total, out).await?,
    }
    Ok(())
}
