//! Command-line front end for the catalog store.
//!
//! # Responsibility
//! - Resolve configuration from file, flags and environment.
//! - Open the store (running migrations) and dispatch one command.
//! - Keep output plain text so it can be piped.
//!
//! # Invariants
//! - Moderation commands run only after an administrator login.
//! - Seller and buyer commands act as the logged-in account, never as an
//!   id taken from the command line.

use clap::{Args, Parser, Subcommand, ValueEnum};
use mavmart_core::checkout::local_today;
use mavmart_core::db::Connection;
use mavmart_core::{
    format_cents, init_logging, open_db, parse_dollars, AccountRepository, AccountService,
    CatalogConfig, Category, Condition, Listing, ListingDraft, ListingFilter, ListingService,
    NewAccount, PaymentDetails, Session, SqliteAccountRepository, SqliteListingRepository,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "mavmart", version, about = "MavMart catalog store")]
struct Cli {
    /// JSON config file; flags and environment override its values.
    #[arg(long, env = "MAVMART_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long, env = "MAVMART_DB")]
    db: Option<PathBuf>,

    #[arg(long, env = "MAVMART_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files.
    #[arg(long, env = "MAVMART_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register an account.
    Register(RegisterArgs),
    /// Check credentials.
    Login(LoginArgs),
    /// List every account (administrator).
    Accounts {
        #[command(flatten)]
        admin: Credentials,
    },
    /// Re-enable an account (administrator).
    Enable {
        id: i64,
        #[command(flatten)]
        admin: Credentials,
    },
    /// Disable an account and hide its listings (administrator).
    Disable {
        id: i64,
        #[command(flatten)]
        admin: Credentials,
    },
    /// Every listing with its seller name (administrator).
    AllListings {
        #[command(flatten)]
        admin: Credentials,
    },
    /// Create a listing as the logged-in seller.
    AddListing(AddListingArgs),
    /// The logged-in seller's listings, hidden ones included.
    MyListings {
        #[command(flatten)]
        seller: Credentials,
    },
    /// Delete a listing the logged-in seller owns.
    DeleteListing {
        id: i64,
        #[command(flatten)]
        seller: Credentials,
    },
    /// Show the buyer feed.
    Listings,
    /// Search visible listings.
    Search(SearchArgs),
    /// Buy one visible listing in a fresh session.
    Buy(BuyArgs),
    /// Print the core version.
    Version,
}

#[derive(Debug, Args)]
struct RegisterArgs {
    #[arg(long)]
    first: String,
    #[arg(long)]
    last: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    /// Create an administrator account.
    #[arg(long)]
    admin: bool,
}

#[derive(Debug, Args)]
struct Credentials {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[derive(Debug, Args)]
struct LoginArgs {
    #[command(flatten)]
    credentials: Credentials,
    #[arg(long)]
    admin: bool,
}

#[derive(Debug, Args)]
struct AddListingArgs {
    #[command(flatten)]
    seller: Credentials,
    #[arg(long)]
    title: String,
    /// Dollar amount such as 12.34 or $12.
    #[arg(long)]
    price: String,
    #[arg(long, value_enum, default_value_t = CategoryArg::General)]
    category: CategoryArg,
    #[arg(long, value_enum, default_value_t = ConditionArg::Good)]
    condition: ConditionArg,
    #[arg(long)]
    description: Option<String>,
    #[arg(long = "photo")]
    photos: Vec<String>,
}

#[derive(Debug, Args)]
struct SearchArgs {
    query: Option<String>,
    #[arg(long = "category", value_enum)]
    categories: Vec<CategoryArg>,
    #[arg(long)]
    min: Option<String>,
    #[arg(long)]
    max: Option<String>,
}

#[derive(Debug, Args)]
struct BuyArgs {
    #[command(flatten)]
    buyer: Credentials,
    #[arg(long)]
    listing: i64,
    #[arg(long, default_value_t = 1)]
    quantity: i32,
    #[arg(long)]
    card: String,
    /// MM/YY
    #[arg(long)]
    expiry: String,
    #[arg(long)]
    cvc: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    General,
    Electronics,
    Books,
    Clothing,
    Furniture,
    Other,
}

impl From<CategoryArg> for Category {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::General => Self::General,
            CategoryArg::Electronics => Self::Electronics,
            CategoryArg::Books => Self::Books,
            CategoryArg::Clothing => Self::Clothing,
            CategoryArg::Furniture => Self::Furniture,
            CategoryArg::Other => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConditionArg {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl From<ConditionArg> for Condition {
    fn from(value: ConditionArg) -> Self {
        match value {
            ConditionArg::New => Self::New,
            ConditionArg::LikeNew => Self::LikeNew,
            ConditionArg::Good => Self::Good,
            ConditionArg::Fair => Self::Fair,
            ConditionArg::Poor => Self::Poor,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Command::Version = cli.command {
        println!("mavmart_core version={}", mavmart_core::core_version());
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)?;
    execute(cli.command, &conn)
}

fn execute(command: Command, conn: &Connection) -> CliResult<()> {
    let accounts = AccountService::new(SqliteAccountRepository::try_new(conn)?);
    let listings = ListingService::new(SqliteListingRepository::try_new(conn)?);

    match command {
        Command::Register(args) => {
            let account = NewAccount::regular(args.first, args.last, args.email, args.password);
            let account = if args.admin {
                accounts.register_admin(account)?
            } else {
                accounts.register(account)?
            };
            println!("registered id={} email={}", account.id, account.email);
        }
        Command::Login(args) => {
            let session = if args.admin {
                admin_session(&accounts, &args.credentials)?
            } else {
                user_session(&accounts, &args.credentials)?
            };
            println!(
                "login ok id={} name={}",
                session.account_id(),
                session.account().display_name()
            );
        }
        Command::Accounts { admin } => {
            admin_session(&accounts, &admin)?;
            for account in accounts.list_accounts()? {
                println!(
                    "{}\t{}\t{}\t{:?}\t{}",
                    account.id,
                    account.display_name(),
                    account.email,
                    account.role,
                    if account.enabled { "enabled" } else { "disabled" }
                );
            }
        }
        Command::Enable { id, admin } => {
            admin_session(&accounts, &admin)?;
            accounts.set_account_enabled(id, true)?;
            println!("enabled id={id}");
        }
        Command::Disable { id, admin } => {
            admin_session(&accounts, &admin)?;
            accounts.set_account_enabled(id, false)?;
            println!("disabled id={id}");
        }
        Command::AllListings { admin } => {
            admin_session(&accounts, &admin)?;
            let account_repo = SqliteAccountRepository::try_new(conn)?;
            for row in listings.list_all_listings(&account_repo)? {
                println!(
                    "{}\t{}\t{}\t{}",
                    row.listing.id,
                    row.listing.title,
                    format_cents(row.listing.price_cents),
                    row.seller_name
                );
            }
        }
        Command::AddListing(args) => {
            let seller = user_session(&accounts, &args.seller)?;
            let price_cents = parse_price(&args.price)?;
            let listing = listings.create_listing(
                seller.account_id(),
                ListingDraft {
                    title: args.title,
                    description: args.description,
                    category: args.category.into(),
                    price_cents,
                    condition: args.condition.into(),
                    photos: args.photos,
                },
            )?;
            println!("created id={} price={}", listing.id, format_cents(listing.price_cents));
        }
        Command::MyListings { seller } => {
            let seller = user_session(&accounts, &seller)?;
            for listing in listings.my_listings(seller.account_id())? {
                print_listing(&listing);
            }
        }
        Command::DeleteListing { id, seller } => {
            let seller = user_session(&accounts, &seller)?;
            listings.delete_listing(seller.account_id(), id)?;
            println!("deleted id={id}");
        }
        Command::Listings => {
            for listing in listings.browse()? {
                print_listing(&listing);
            }
        }
        Command::Search(args) => {
            let filter = ListingFilter {
                query: args.query,
                categories: args.categories.into_iter().map(Category::from).collect(),
                min_price_cents: args.min.as_deref().map(parse_price).transpose()?,
                max_price_cents: args.max.as_deref().map(parse_price).transpose()?,
            };
            for listing in listings.search(&filter)? {
                print_listing(&listing);
            }
        }
        Command::Buy(args) => {
            let mut session = user_session(&accounts, &args.buyer)?;
            let listing = listings
                .get_visible_listing(args.listing)?
                .ok_or_else(|| format!("listing not found: {}", args.listing))?;
            session.add_to_cart(&listing, args.quantity)?;

            let payment = PaymentDetails {
                card_number: args.card,
                expiry: args.expiry,
                cvc: args.cvc,
            };
            let receipt = session.place_order(&payment, local_today())?;
            println!(
                "order placed items={} total={}",
                receipt.item_count,
                format_cents(receipt.total_cents)
            );
        }
        Command::Version => println!("mavmart_core version={}", mavmart_core::core_version()),
    }

    Ok(())
}

fn user_session<R: AccountRepository>(
    accounts: &AccountService<R>,
    credentials: &Credentials,
) -> CliResult<Session> {
    accounts
        .login_user(&credentials.email, &credentials.password)?
        .ok_or_else(|| "Invalid credentials".into())
}

fn admin_session<R: AccountRepository>(
    accounts: &AccountService<R>,
    credentials: &Credentials,
) -> CliResult<Session> {
    accounts
        .login_admin(&credentials.email, &credentials.password)?
        .ok_or_else(|| "Invalid credentials".into())
}

fn resolve_config(cli: &Cli) -> CliResult<CatalogConfig> {
    let mut config = match &cli.config {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    config.validate()?;
    Ok(config)
}

fn parse_price(text: &str) -> CliResult<i64> {
    parse_dollars(text).ok_or_else(|| format!("invalid price `{text}`").into())
}

fn print_listing(listing: &Listing) {
    println!(
        "{}\t{}\t{}\t{}\t{}",
        listing.id,
        listing.title,
        format_cents(listing.price_cents),
        listing.category.label(),
        listing.condition.label()
    );
}
