//! Teeshop CLI - browse the shop, manage a cart and check out from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Start a session (persisted between runs)
//! teeshop auth login -e ayesha@example.pk -p 'secret'
//!
//! # Browse and buy
//! teeshop products list --category oversized --size xl --sort price-low
//! teeshop cart add 665f1c2e9a 'Extra Large' -q 2
//! teeshop checkout --street '12 Mall Road' --city Lahore --postal-code 54000
//!
//! # Admin console
//! teeshop admin orders --status pending
//! ```
//!
//! # Environment Variables
//!
//! - `TEESHOP_API_URL` - Backend base URL
//! - `TEESHOP_SESSION_FILE` - Where the session is persisted
//! - `SENTRY_DSN` - Optional Sentry DSN
//! - `RUST_LOG` - Log filter (default: `teeshop_storefront=info,teeshop_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use teeshop_core::{Email, OrderId, OrderStatus, ProductId, Size, UserId};
use teeshop_storefront::catalog::ProductSort;
use teeshop_storefront::{Storefront, StorefrontConfig};

mod commands;
mod error;
mod output;

use error::CliError;

#[derive(Parser)]
#[command(name = "teeshop")]
#[command(author, version, about = "Teeshop storefront from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, sign up, manage the profile
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Place an order for everything in the cart
    Checkout {
        #[arg(long)]
        street: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        postal_code: String,
    },
    /// Order history and ratings
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Admin console
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: Email,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account and log in
    Signup {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: Email,
        #[arg(short, long)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the current session
    Whoami,
    /// Refresh or edit the profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products with the filter panel options
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        size: Option<Size>,
        #[arg(long)]
        min_price: Option<Decimal>,
        #[arg(long)]
        max_price: Option<Decimal>,
        #[arg(long)]
        search: Option<String>,
        /// newest, price-low, price-high, popular
        #[arg(long, default_value = "newest")]
        sort: ProductSort,
    },
    /// Show one product and related products
    Show { id: ProductId },
    /// Search by text
    Search { query: String },
    /// Best sellers
    Top {
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// New arrivals
    New {
        #[arg(short, long)]
        limit: Option<u32>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product in a size
    Add {
        product_id: ProductId,
        size: Size,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity
    Set {
        product_id: ProductId,
        size: Size,
        quantity: u32,
    },
    /// Remove a line
    Remove { product_id: ProductId, size: Size },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show the wishlist
    Show,
    /// Save or unsave a product
    Toggle { product_id: ProductId },
    /// Unsave a product
    Remove { product_id: ProductId },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders
    List,
    /// Show one order
    Show { id: OrderId },
    /// Rate a product of a delivered order
    Rate {
        order_id: OrderId,
        product_id: ProductId,
        /// 1 to 5
        stars: u8,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Dashboard numbers
    Analytics,
    /// List orders
    Orders {
        /// A status or `all`
        #[arg(long, default_value = "all")]
        status: String,
        #[arg(long)]
        search: Option<String>,
    },
    /// Change an order's status
    SetStatus { id: OrderId, status: OrderStatus },
    /// Set stock for a size
    Stock {
        id: ProductId,
        size: Size,
        stock: u32,
    },
    /// Delete a product
    DeleteProduct { id: ProductId },
    /// List users
    Users,
    /// Grant or revoke admin rights
    Role {
        id: UserId,
        #[arg(long)]
        admin: bool,
    },
    /// Delete a user
    DeleteUser { id: UserId },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            output::failure(&format!("Configuration error: {e}"));
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "teeshop_storefront=info,teeshop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        output::failure(&e.user_message());
        if e.needs_login() {
            output::failure("Run `teeshop auth login` to start a new session.");
        }
        tracing::debug!(error = ?e, "Command failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), CliError> {
    let shop = Storefront::open(config).await?;

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(&shop, &email, password).await
            }
            AuthAction::Signup {
                name,
                email,
                password,
            } => commands::auth::signup(&shop, &name, &email, password).await,
            AuthAction::Logout => commands::auth::logout(&shop).await,
            AuthAction::Whoami => {
                commands::auth::whoami(&shop);
                Ok(())
            }
            AuthAction::Profile { name, address } => {
                commands::auth::profile(&shop, name, address).await
            }
        },
        Commands::Products { action } => match action {
            ProductAction::List {
                category,
                size,
                min_price,
                max_price,
                search,
                sort,
            } => {
                let filter = commands::products::filter(
                    category, size, min_price, max_price, search, sort,
                );
                commands::products::list(&shop, &filter).await
            }
            ProductAction::Show { id } => commands::products::show(&shop, &id).await,
            ProductAction::Search { query } => commands::products::search(&shop, &query).await,
            ProductAction::Top { limit } => commands::products::top_selling(&shop, limit).await,
            ProductAction::New { limit } => commands::products::new_arrivals(&shop, limit).await,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&shop).await,
            CartAction::Add {
                product_id,
                size,
                quantity,
            } => commands::cart::add(&shop, &product_id, size, quantity).await,
            CartAction::Set {
                product_id,
                size,
                quantity,
            } => commands::cart::set(&shop, &product_id, size, quantity).await,
            CartAction::Remove { product_id, size } => {
                commands::cart::remove(&shop, &product_id, size).await
            }
            CartAction::Clear => commands::cart::clear(&shop).await,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&shop).await,
            WishlistAction::Toggle { product_id } => {
                commands::wishlist::toggle(&shop, &product_id).await
            }
            WishlistAction::Remove { product_id } => {
                commands::wishlist::remove(&shop, &product_id).await
            }
        },
        Commands::Checkout {
            street,
            city,
            postal_code,
        } => commands::orders::checkout(&shop, street, city, postal_code).await,
        Commands::Orders { action } => match action {
            OrderAction::List => commands::orders::list(&shop).await,
            OrderAction::Show { id } => commands::orders::show(&shop, &id).await,
            OrderAction::Rate {
                order_id,
                product_id,
                stars,
            } => commands::orders::rate(&shop, &order_id, &product_id, stars).await,
        },
        Commands::Admin { action } => match action {
            AdminAction::Analytics => commands::admin::analytics(&shop).await,
            AdminAction::Orders { status, search } => {
                commands::admin::orders(&shop, &status, search).await
            }
            AdminAction::SetStatus { id, status } => {
                commands::admin::set_status(&shop, &id, status).await
            }
            AdminAction::Stock { id, size, stock } => {
                commands::admin::stock(&shop, &id, size, stock).await
            }
            AdminAction::DeleteProduct { id } => commands::admin::delete_product(&shop, &id).await,
            AdminAction::Users => commands::admin::users(&shop).await,
            AdminAction::Role { id, admin } => commands::admin::role(&shop, &id, admin).await,
            AdminAction::DeleteUser { id } => commands::admin::delete_user(&shop, &id).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_cart_add() {
        let cli = Cli::try_parse_from(["teeshop", "cart", "add", "p1", "xl", "-q", "2"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Cart {
                action: CartAction::Add {
                    size: Size::ExtraLarge,
                    quantity: 2,
                    ..
                }
            })
        ));
    }

    #[test]
    fn test_rejects_unknown_size() {
        assert!(Cli::try_parse_from(["teeshop", "cart", "add", "p1", "medium"]).is_err());
    }
}
