//! Core catalog store for MavMart.
//! This crate is the single source of truth for account, listing and cart invariants.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod credential;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cart::{CartItem, CartItemId, CartLedger};
pub use checkout::{CheckoutFieldError, PaymentDetails, PaymentValidationErrors};
pub use config::{CatalogConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{
    default_log_level, init_logging, logging_status, LoggingError, LoggingStatus,
};
pub use model::account::{Account, AccountId, AccountValidationError, NewAccount, Role};
pub use model::listing::{
    Category, Condition, Listing, ListingFilter, ListingId, ListingStatus,
    ListingValidationError, NewListing,
};
pub use model::money::{format_cents, parse_dollars};
pub use repo::account_repo::{AccountRepository, SqliteAccountRepository};
pub use repo::listing_repo::{ListingRepository, SqliteListingRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountService, AccountServiceError, ProfileUpdate};
pub use service::listing_service::{
    ListingDraft, ListingOverview, ListingService, ListingServiceError,
};
pub use service::session::{OrderReceipt, Session, SessionError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
