//! Listing domain model.
//!
//! # Responsibility
//! - Define a seller's catalog item and its closed enumerations.
//! - Provide the buyer-side search filter over listings.
//!
//! # Invariants
//! - `title` is non-empty after trimming.
//! - `price_cents` is never negative.
//! - `seller_id` and `created_at` never change after insert.
//! - `photos` are opaque identifiers; bytes are never loaded here.

use crate::model::account::AccountId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable listing identifier assigned by storage.
pub type ListingId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    General,
    Electronics,
    Books,
    Clothing,
    Furniture,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::General,
        Self::Electronics,
        Self::Books,
        Self::Clothing,
        Self::Furniture,
        Self::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Electronics => "Electronics",
            Self::Books => "Books",
            Self::Clothing => "Clothing",
            Self::Furniture => "Furniture",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::LikeNew => "Like new",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

/// Listing lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Offered for sale.
    Active,
    /// Held for a buyer.
    Reserved,
    /// No longer available.
    Sold,
}

/// Persisted listing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub seller_id: AccountId,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub price_cents: i64,
    pub condition: Condition,
    /// Ordered opaque photo identifiers (URIs).
    pub photos: Vec<String>,
    pub status: ListingStatus,
    /// Unix epoch milliseconds, assigned when the seller created it.
    pub created_at: i64,
}

impl Listing {
    pub fn validate(&self) -> Result<(), ListingValidationError> {
        validate_fields(&self.title, self.price_cents)
    }
}

/// Insert input for a listing not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    pub seller_id: AccountId,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub price_cents: i64,
    pub condition: Condition,
    pub photos: Vec<String>,
    pub status: ListingStatus,
    pub created_at: i64,
}

impl NewListing {
    /// Creates an active listing with no description or photos.
    pub fn new(
        seller_id: AccountId,
        title: impl Into<String>,
        category: Category,
        price_cents: i64,
        condition: Condition,
        created_at: i64,
    ) -> Self {
        Self {
            seller_id,
            title: title.into(),
            description: None,
            category,
            price_cents,
            condition,
            photos: Vec::new(),
            status: ListingStatus::Active,
            created_at,
        }
    }

    pub fn validate(&self) -> Result<(), ListingValidationError> {
        validate_fields(&self.title, self.price_cents)
    }

    /// Materializes the stored shape once storage assigned an id.
    pub fn into_listing(self, id: ListingId) -> Listing {
        Listing {
            id,
            seller_id: self.seller_id,
            title: self.title,
            description: self.description,
            category: self.category,
            price_cents: self.price_cents,
            condition: self.condition,
            photos: self.photos,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingValidationError {
    EmptyTitle,
    NegativePrice(i64),
}

impl Display for ListingValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "listing title must not be empty"),
            Self::NegativePrice(value) => write!(f, "listing price must not be negative: {value}"),
        }
    }
}

impl Error for ListingValidationError {}

fn validate_fields(title: &str, price_cents: i64) -> Result<(), ListingValidationError> {
    if title.trim().is_empty() {
        return Err(ListingValidationError::EmptyTitle);
    }
    if price_cents < 0 {
        return Err(ListingValidationError::NegativePrice(price_cents));
    }
    Ok(())
}

/// Buyer-side search filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Case-insensitive substring of title or description.
    pub query: Option<String>,
    /// Allowed categories; empty means any.
    pub categories: Vec<Category>,
    /// Inclusive lower price bound in cents.
    pub min_price_cents: Option<i64>,
    /// Inclusive upper price bound in cents.
    pub max_price_cents: Option<i64>,
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        self.matches_query(listing)
            && (self.categories.is_empty() || self.categories.contains(&listing.category))
            && self
                .min_price_cents
                .map_or(true, |min| listing.price_cents >= min)
            && self
                .max_price_cents
                .map_or(true, |max| listing.price_cents <= max)
    }

    fn matches_query(&self, listing: &Listing) -> bool {
        let Some(query) = self.query.as_deref().map(str::trim) else {
            return true;
        };
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        listing.title.to_lowercase().contains(&needle)
            || listing
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(&needle))
    }
}
