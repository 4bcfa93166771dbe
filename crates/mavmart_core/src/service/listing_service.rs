//! Listing use-case service.
//!
//! # Responsibility
//! - Seller-side create/edit/delete restricted to the owning seller.
//! - Buyer-side browse and search over visible listings.
//! - Administrator overview of every listing with its seller name.
//!
//! # Invariants
//! - Creation timestamps are assigned here and strictly increase within
//!   one process, so newest-first ordering follows creation order.
//! - Titles are trimmed; blank descriptions and blank photo ids are dropped.

use crate::model::account::AccountId;
use crate::model::listing::{
    Category, Condition, Listing, ListingFilter, ListingId, ListingStatus,
    ListingValidationError, NewListing,
};
use crate::repo::account_repo::AccountRepository;
use crate::repo::listing_repo::ListingRepository;
use crate::repo::{RepoError, RepoResult};
use chrono::Utc;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_CREATED_AT: AtomicI64 = AtomicI64::new(0);

/// Service error for listing use-cases.
#[derive(Debug)]
pub enum ListingServiceError {
    InvalidInput(ListingValidationError),
    ListingNotFound(ListingId),
    /// The acting seller does not own the listing.
    NotOwner {
        listing_id: ListingId,
        seller_id: AccountId,
    },
    /// The seller id does not reference an account.
    UnknownSeller(AccountId),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for ListingServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::ListingNotFound(id) => write!(f, "listing not found: {id}"),
            Self::NotOwner {
                listing_id,
                seller_id,
            } => write!(f, "listing {listing_id} is not owned by seller {seller_id}"),
            Self::UnknownSeller(id) => write!(f, "seller account not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent listing state: {details}"),
        }
    }
}

impl Error for ListingServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ListingServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidListing(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

/// Seller-editable listing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub price_cents: i64,
    pub condition: Condition,
    pub photos: Vec<String>,
}

impl ListingDraft {
    fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self
                .description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            photos: self
                .photos
                .into_iter()
                .filter(|photo| !photo.trim().is_empty())
                .collect(),
            ..self
        }
    }
}

/// One row of the administrator listing overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingOverview {
    pub listing: Listing,
    /// "First Last", or "Unknown" when the seller row is gone.
    pub seller_name: String,
}

/// Listing service facade over repository implementations.
pub struct ListingService<R: ListingRepository> {
    repo: R,
}

impl<R: ListingRepository> ListingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an active listing owned by `seller_id`.
    pub fn create_listing(
        &self,
        seller_id: AccountId,
        draft: ListingDraft,
    ) -> Result<Listing, ListingServiceError> {
        let draft = draft.normalized();
        let listing = NewListing {
            seller_id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            price_cents: draft.price_cents,
            condition: draft.condition,
            photos: draft.photos,
            status: ListingStatus::Active,
            created_at: next_created_at(),
        };

        let id = self.repo.create(&listing).map_err(|err| match err {
            RepoError::ConstraintViolation(_) => ListingServiceError::UnknownSeller(seller_id),
            other => other.into(),
        })?;
        info!("event=listing_create module=service status=ok listing_id={id} seller_id={seller_id}");

        self.repo
            .get_by_id(id)?
            .ok_or(ListingServiceError::InconsistentState(
                "created listing not found in read-back",
            ))
    }

    /// Replaces the editable fields and status of a listing the seller owns.
    pub fn edit_listing(
        &self,
        seller_id: AccountId,
        listing_id: ListingId,
        draft: ListingDraft,
        status: ListingStatus,
    ) -> Result<Listing, ListingServiceError> {
        let mut listing = self.owned_listing(seller_id, listing_id)?;
        let draft = draft.normalized();
        listing.title = draft.title;
        listing.description = draft.description;
        listing.category = draft.category;
        listing.price_cents = draft.price_cents;
        listing.condition = draft.condition;
        listing.photos = draft.photos;
        listing.status = status;

        if !self.repo.update(&listing)? {
            return Err(ListingServiceError::ListingNotFound(listing_id));
        }
        info!("event=listing_update module=service status=ok listing_id={listing_id}");

        self.repo
            .get_by_id(listing_id)?
            .ok_or(ListingServiceError::InconsistentState(
                "updated listing not found in read-back",
            ))
    }

    /// Deletes a listing the seller owns.
    pub fn delete_listing(
        &self,
        seller_id: AccountId,
        listing_id: ListingId,
    ) -> Result<(), ListingServiceError> {
        self.owned_listing(seller_id, listing_id)?;
        if !self.repo.delete(listing_id)? {
            return Err(ListingServiceError::ListingNotFound(listing_id));
        }
        info!("event=listing_delete module=service status=ok listing_id={listing_id}");
        Ok(())
    }

    /// The seller's own listings, including when the seller is disabled.
    pub fn my_listings(&self, seller_id: AccountId) -> RepoResult<Vec<Listing>> {
        self.repo.get_by_seller(seller_id)
    }

    pub fn get_listing(&self, listing_id: ListingId) -> RepoResult<Option<Listing>> {
        self.repo.get_by_id(listing_id)
    }

    /// Buyer feed: listings of enabled sellers, newest first.
    pub fn browse(&self) -> RepoResult<Vec<Listing>> {
        self.repo.get_all_visible()
    }

    /// A listing as buyers see it: `None` when missing or when its seller
    /// is disabled.
    pub fn get_visible_listing(&self, listing_id: ListingId) -> RepoResult<Option<Listing>> {
        Ok(self
            .repo
            .get_all_visible()?
            .into_iter()
            .find(|listing| listing.id == listing_id))
    }

    /// Buyer search over the visible feed, order preserved.
    pub fn search(&self, filter: &ListingFilter) -> RepoResult<Vec<Listing>> {
        let mut listings = self.repo.get_all_visible()?;
        listings.retain(|listing| filter.matches(listing));
        Ok(listings)
    }

    /// Every listing with its seller's display name.
    pub fn list_all_listings<A: AccountRepository>(
        &self,
        accounts: &A,
    ) -> RepoResult<Vec<ListingOverview>> {
        let mut rows = Vec::new();
        for listing in self.repo.get_all()? {
            let seller_name = accounts
                .get_by_id(listing.seller_id)?
                .map(|account| account.display_name())
                .unwrap_or_else(|| "Unknown".to_string());
            rows.push(ListingOverview {
                listing,
                seller_name,
            });
        }
        Ok(rows)
    }

    fn owned_listing(
        &self,
        seller_id: AccountId,
        listing_id: ListingId,
    ) -> Result<Listing, ListingServiceError> {
        let listing = self
            .repo
            .get_by_id(listing_id)?
            .ok_or(ListingServiceError::ListingNotFound(listing_id))?;
        if listing.seller_id != seller_id {
            return Err(ListingServiceError::NotOwner {
                listing_id,
                seller_id,
            });
        }
        Ok(listing)
    }
}

/// Wall-clock epoch millis, bumped when needed so values never repeat.
fn next_created_at() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_CREATED_AT.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_CREATED_AT.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{next_created_at, ListingDraft};
    use crate::model::listing::{Category, Condition};

    #[test]
    fn created_at_strictly_increases() {
        let first = next_created_at();
        let second = next_created_at();
        let third = next_created_at();
        assert!(first < second && second < third);
    }

    #[test]
    fn draft_normalization_trims_and_drops_blanks() {
        let draft = ListingDraft {
            title: "  Desk ".to_string(),
            description: Some("   ".to_string()),
            category: Category::Furniture,
            price_cents: 1234,
            condition: Condition::Good,
            photos: vec!["".to_string(), "content://1".to_string()],
        }
        .normalized();

        assert_eq!(draft.title, "Desk");
        assert_eq!(draft.description, None);
        assert_eq!(draft.photos, ["content://1"]);
    }
}
