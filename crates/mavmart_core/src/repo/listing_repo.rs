//! Listing repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and catalog queries over `listings` storage.
//! - Own the buyer-facing visibility rule (seller must be enabled).
//! - Encode/decode photo references as a JSON text column.
//!
//! # Invariants
//! - Every list query is ordered `created_at DESC, id DESC`.
//! - `update` never writes `seller_id` or `created_at`.
//! - A malformed photo blob reads back as no photos; other invalid
//!   persisted values are rejected.

use crate::model::account::AccountId;
use crate::model::listing::{
    Category, Condition, Listing, ListingId, ListingStatus, NewListing,
};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;

const LISTING_COLUMNS_SQL: &str = "
    l.id AS id,
    l.seller_id AS seller_id,
    l.title AS title,
    l.description AS description,
    l.category AS category,
    l.price_cents AS price_cents,
    l.condition AS condition,
    l.photos_json AS photos_json,
    l.status AS status,
    l.created_at AS created_at";

const NEWEST_FIRST_SQL: &str = "ORDER BY l.created_at DESC, l.id DESC";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "seller_id",
    "title",
    "description",
    "category",
    "price_cents",
    "condition",
    "photos_json",
    "status",
    "created_at",
];

/// Repository interface for listing operations.
pub trait ListingRepository {
    /// Inserts with the caller-assigned creation time.
    fn create(&self, listing: &NewListing) -> RepoResult<ListingId>;
    /// All listings, newest first, no visibility filter.
    fn get_all(&self) -> RepoResult<Vec<Listing>>;
    /// Listings whose seller is enabled, newest first.
    fn get_all_visible(&self) -> RepoResult<Vec<Listing>>;
    /// One seller's listings, newest first, regardless of seller state.
    fn get_by_seller(&self, seller_id: AccountId) -> RepoResult<Vec<Listing>>;
    fn get_by_id(&self, id: ListingId) -> RepoResult<Option<Listing>>;
    /// Replaces the mutable fields. Returns `false` when the id is gone.
    fn update(&self, listing: &Listing) -> RepoResult<bool>;
    /// Returns `false` when nothing was deleted.
    fn delete(&self, id: ListingId) -> RepoResult<bool>;
}

/// SQLite-backed listing repository.
pub struct SqliteListingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteListingRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "listings", REQUIRED_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ListingRepository for SqliteListingRepository<'_> {
    fn create(&self, listing: &NewListing) -> RepoResult<ListingId> {
        listing.validate()?;

        self.conn.execute(
            "INSERT INTO listings (
                seller_id,
                title,
                description,
                category,
                price_cents,
                condition,
                photos_json,
                status,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                listing.seller_id,
                listing.title.as_str(),
                listing.description.as_deref(),
                category_to_db(listing.category),
                listing.price_cents,
                condition_to_db(listing.condition),
                encode_photo_refs(&listing.photos),
                status_to_db(listing.status),
                listing.created_at,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_all(&self) -> RepoResult<Vec<Listing>> {
        self.query_list(
            &format!("SELECT {LISTING_COLUMNS_SQL} FROM listings l {NEWEST_FIRST_SQL};"),
            [],
        )
    }

    fn get_all_visible(&self) -> RepoResult<Vec<Listing>> {
        self.query_list(
            &format!(
                "SELECT {LISTING_COLUMNS_SQL}
                 FROM listings l
                 INNER JOIN accounts a ON a.id = l.seller_id
                 WHERE a.enabled = 1
                 {NEWEST_FIRST_SQL};"
            ),
            [],
        )
    }

    fn get_by_seller(&self, seller_id: AccountId) -> RepoResult<Vec<Listing>> {
        self.query_list(
            &format!(
                "SELECT {LISTING_COLUMNS_SQL}
                 FROM listings l
                 WHERE l.seller_id = ?1
                 {NEWEST_FIRST_SQL};"
            ),
            params![seller_id],
        )
    }

    fn get_by_id(&self, id: ListingId) -> RepoResult<Option<Listing>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LISTING_COLUMNS_SQL} FROM listings l WHERE l.id = ?1;"
        ))?;
        let row = stmt
            .query_row(params![id], |row| Ok(parse_listing_row(row)))
            .optional()?;
        row.transpose()
    }

    fn update(&self, listing: &Listing) -> RepoResult<bool> {
        listing.validate()?;

        let changed = self.conn.execute(
            "UPDATE listings
             SET
                title = ?1,
                description = ?2,
                category = ?3,
                price_cents = ?4,
                condition = ?5,
                photos_json = ?6,
                status = ?7
             WHERE id = ?8;",
            params![
                listing.title.as_str(),
                listing.description.as_deref(),
                category_to_db(listing.category),
                listing.price_cents,
                condition_to_db(listing.condition),
                encode_photo_refs(&listing.photos),
                status_to_db(listing.status),
                listing.id,
            ],
        )?;

        Ok(changed > 0)
    }

    fn delete(&self, id: ListingId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM listings WHERE id = ?1;", params![id])?;
        Ok(changed > 0)
    }
}

impl SqliteListingRepository<'_> {
    fn query_list(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Listing>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut listings = Vec::new();
        while let Some(row) = rows.next()? {
            listings.push(parse_listing_row(row)?);
        }
        Ok(listings)
    }
}

/// Serializes photo references as a JSON array of strings (`[]` when empty).
pub fn encode_photo_refs(photos: &[String]) -> String {
    serde_json::to_string(photos).unwrap_or_else(|_| String::from("[]"))
}

/// Decodes a stored photo blob.
///
/// Blank and non-string elements are dropped; anything that is not a JSON
/// array decodes to an empty list instead of failing the read.
pub fn decode_photo_refs(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) if !text.trim().is_empty() => Some(text),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_listing_row(row: &Row<'_>) -> RepoResult<Listing> {
    let category_text: String = row.get("category")?;
    let category = parse_category(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in listings.category"
        ))
    })?;

    let condition_text: String = row.get("condition")?;
    let condition = parse_condition(&condition_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid condition `{condition_text}` in listings.condition"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in listings.status"))
    })?;

    let photos = row
        .get::<_, Option<String>>("photos_json")?
        .map(|raw| decode_photo_refs(&raw))
        .unwrap_or_default();

    Ok(Listing {
        id: row.get("id")?,
        seller_id: row.get("seller_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        category,
        price_cents: row.get("price_cents")?,
        condition,
        photos,
        status,
        created_at: row.get("created_at")?,
    })
}

fn category_to_db(category: Category) -> &'static str {
    match category {
        Category::General => "general",
        Category::Electronics => "electronics",
        Category::Books => "books",
        Category::Clothing => "clothing",
        Category::Furniture => "furniture",
        Category::Other => "other",
    }
}

fn parse_category(value: &str) -> Option<Category> {
    match value {
        "general" => Some(Category::General),
        "electronics" => Some(Category::Electronics),
        "books" => Some(Category::Books),
        "clothing" => Some(Category::Clothing),
        "furniture" => Some(Category::Furniture),
        "other" => Some(Category::Other),
        _ => None,
    }
}

fn condition_to_db(condition: Condition) -> &'static str {
    match condition {
        Condition::New => "new",
        Condition::LikeNew => "like_new",
        Condition::Good => "good",
        Condition::Fair => "fair",
        Condition::Poor => "poor",
    }
}

fn parse_condition(value: &str) -> Option<Condition> {
    match value {
        "new" => Some(Condition::New),
        "like_new" => Some(Condition::LikeNew),
        "good" => Some(Condition::Good),
        "fair" => Some(Condition::Fair),
        "poor" => Some(Condition::Poor),
        _ => None,
    }
}

fn status_to_db(status: ListingStatus) -> &'static str {
    match status {
        ListingStatus::Active => "active",
        ListingStatus::Reserved => "reserved",
        ListingStatus::Sold => "sold",
    }
}

fn parse_status(value: &str) -> Option<ListingStatus> {
    match value {
        "active" => Some(ListingStatus::Active),
        "reserved" => Some(ListingStatus::Reserved),
        "sold" => Some(ListingStatus::Sold),
        _ => None,
    }
}
