use mavmart_core::db::open_db_in_memory;
use mavmart_core::{
    format_cents, AccountRepository, Category, Condition, Listing, ListingDraft, ListingFilter,
    ListingRepository, ListingService, ListingServiceError, ListingStatus, NewAccount,
    NewListing, RepoError, SqliteAccountRepository, SqliteListingRepository,
};
use rusqlite::Connection;

fn seed_seller(conn: &Connection, first: &str, email: &str) -> i64 {
    SqliteAccountRepository::try_new(conn)
        .unwrap()
        .create(&NewAccount::regular(first, "Seller", email, "pw"))
        .unwrap()
}

fn draft(title: &str, category: Category, price_cents: i64) -> ListingDraft {
    ListingDraft {
        title: title.to_string(),
        description: None,
        category,
        price_cents,
        condition: Condition::Good,
        photos: Vec::new(),
    }
}

#[test]
fn create_and_read_back_listing() {
    let conn = open_db_in_memory().unwrap();
    let seller = seed_seller(&conn, "Ann", "ann@x.com");
    let repo = SqliteListingRepository::try_new(&conn).unwrap();

    let mut listing = NewListing::new(seller, "Desk", Category::Furniture, 1234, Condition::Good, 100);
    listing.photos = vec!["content://photo/1".to_string(), "content://photo/2".to_string()];
    let id = repo.create(&listing).unwrap();

    let stored = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(stored, listing.into_listing(id));
    assert_eq!(format_cents(stored.price_cents), "$12.34");
    assert!(repo.get_by_id(id + 1).unwrap().is_none());
}

#[test]
fn visible_feed_hides_disabled_sellers_and_orders_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let bob = seed_seller(&conn, "Bob", "bob@x.com");
    let accounts = SqliteAccountRepository::try_new(&conn).unwrap();
    let repo = SqliteListingRepository::try_new(&conn).unwrap();

    let old = repo
        .create(&NewListing::new(ann, "Lamp", Category::Furniture, 500, Condition::Fair, 10))
        .unwrap();
    let new = repo
        .create(&NewListing::new(ann, "Chair", Category::Furniture, 700, Condition::Good, 20))
        .unwrap();
    let bobs = repo
        .create(&NewListing::new(bob, "Book", Category::Books, 300, Condition::New, 15))
        .unwrap();

    let ids = |rows: Vec<Listing>| {
        rows.into_iter()
            .map(|listing| listing.id)
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(repo.get_all_visible().unwrap()), [new, bobs, old]);

    accounts.set_enabled(ann, false).unwrap();
    assert_eq!(ids(repo.get_all_visible().unwrap()), [bobs]);
    assert_eq!(ids(repo.get_all().unwrap()), [new, bobs, old]);
    assert_eq!(ids(repo.get_by_seller(ann).unwrap()), [new, old]);

    accounts.set_enabled(ann, true).unwrap();
    assert_eq!(repo.get_all_visible().unwrap().len(), 3);
}

#[test]
fn equal_timestamps_fall_back_to_newest_id() {
    let conn = open_db_in_memory().unwrap();
    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let repo = SqliteListingRepository::try_new(&conn).unwrap();

    let first = repo
        .create(&NewListing::new(ann, "A", Category::Other, 1, Condition::Good, 50))
        .unwrap();
    let second = repo
        .create(&NewListing::new(ann, "B", Category::Other, 1, Condition::Good, 50))
        .unwrap();

    let rows = repo.get_all().unwrap();
    assert_eq!(rows[0].id, second);
    assert_eq!(rows[1].id, first);
}

#[test]
fn update_keeps_seller_and_created_at() {
    let conn = open_db_in_memory().unwrap();
    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let bob = seed_seller(&conn, "Bob", "bob@x.com");
    let repo = SqliteListingRepository::try_new(&conn).unwrap();

    let id = repo
        .create(&NewListing::new(ann, "Desk", Category::Furniture, 1234, Condition::Good, 100))
        .unwrap();
    let mut listing = repo.get_by_id(id).unwrap().unwrap();
    listing.title = "Standing desk".to_string();
    listing.status = ListingStatus::Sold;
    listing.seller_id = bob;
    listing.created_at = 999;
    assert!(repo.update(&listing).unwrap());

    let stored = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(stored.title, "Standing desk");
    assert_eq!(stored.status, ListingStatus::Sold);
    assert_eq!(stored.seller_id, ann);
    assert_eq!(stored.created_at, 100);

    listing.id = 9_999;
    assert!(!repo.update(&listing).unwrap());
}

#[test]
fn delete_reports_whether_a_row_was_removed() {
    let conn = open_db_in_memory().unwrap();
    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let repo = SqliteListingRepository::try_new(&conn).unwrap();

    let id = repo
        .create(&NewListing::new(ann, "Desk", Category::Furniture, 1234, Condition::Good, 100))
        .unwrap();
    assert!(repo.delete(id).unwrap());
    assert!(!repo.delete(id).unwrap());
    assert!(repo.get_by_id(id).unwrap().is_none());
}

#[test]
fn removing_seller_row_cascades_to_listings() {
    let conn = open_db_in_memory().unwrap();
    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let repo = SqliteListingRepository::try_new(&conn).unwrap();
    repo.create(&NewListing::new(ann, "Desk", Category::Furniture, 1234, Condition::Good, 100))
        .unwrap();

    conn.execute("DELETE FROM accounts WHERE id = ?1;", [ann])
        .unwrap();
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn malformed_photo_blob_reads_as_no_photos() {
    let conn = open_db_in_memory().unwrap();
    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let repo = SqliteListingRepository::try_new(&conn).unwrap();
    let id = repo
        .create(&NewListing::new(ann, "Desk", Category::Furniture, 1234, Condition::Good, 100))
        .unwrap();

    conn.execute(
        "UPDATE listings SET photos_json = 'not json' WHERE id = ?1;",
        [id],
    )
    .unwrap();
    assert!(repo.get_by_id(id).unwrap().unwrap().photos.is_empty());

    conn.execute(
        r#"UPDATE listings SET photos_json = '["a", "", 3, "b"]' WHERE id = ?1;"#,
        [id],
    )
    .unwrap();
    assert_eq!(repo.get_by_id(id).unwrap().unwrap().photos, ["a", "b"]);
}

#[test]
fn unknown_seller_and_invalid_fields_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteListingRepository::try_new(&conn).unwrap();

    let err = repo
        .create(&NewListing::new(42, "Desk", Category::Furniture, 1234, Condition::Good, 100))
        .unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));

    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let err = repo
        .create(&NewListing::new(ann, "  ", Category::Furniture, 1234, Condition::Good, 100))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidListing(_)));
    let err = repo
        .create(&NewListing::new(ann, "Desk", Category::Furniture, -1, Condition::Good, 100))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidListing(_)));
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn service_enforces_ownership() {
    let conn = open_db_in_memory().unwrap();
    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let bob = seed_seller(&conn, "Bob", "bob@x.com");
    let service = ListingService::new(SqliteListingRepository::try_new(&conn).unwrap());

    let desk = service
        .create_listing(ann, draft("  Desk ", Category::Furniture, 1234))
        .unwrap();
    assert_eq!(desk.title, "Desk");
    assert_eq!(desk.status, ListingStatus::Active);

    assert!(matches!(
        service.edit_listing(bob, desk.id, draft("Mine", Category::Furniture, 1), ListingStatus::Active),
        Err(ListingServiceError::NotOwner { .. })
    ));
    assert!(matches!(
        service.delete_listing(bob, desk.id),
        Err(ListingServiceError::NotOwner { .. })
    ));

    let edited = service
        .edit_listing(ann, desk.id, draft("Desk", Category::Furniture, 999), ListingStatus::Reserved)
        .unwrap();
    assert_eq!(edited.price_cents, 999);
    assert_eq!(edited.status, ListingStatus::Reserved);
    assert_eq!(edited.created_at, desk.created_at);

    service.delete_listing(ann, desk.id).unwrap();
    assert!(matches!(
        service.delete_listing(ann, desk.id),
        Err(ListingServiceError::ListingNotFound(_))
    ));
    assert!(matches!(
        service.create_listing(4_242, draft("Desk", Category::Furniture, 1)),
        Err(ListingServiceError::UnknownSeller(4_242))
    ));
}

#[test]
fn service_search_filters_visible_listings() {
    let conn = open_db_in_memory().unwrap();
    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let bob = seed_seller(&conn, "Bob", "bob@x.com");
    let service = ListingService::new(SqliteListingRepository::try_new(&conn).unwrap());

    let mut lamp = draft("Desk lamp", Category::Furniture, 1500);
    lamp.description = Some("Warm LED light".to_string());
    service.create_listing(ann, lamp).unwrap();
    service
        .create_listing(ann, draft("Calculus textbook", Category::Books, 4000))
        .unwrap();
    service
        .create_listing(bob, draft("USB cable", Category::Electronics, 500))
        .unwrap();

    let titles = |filter: &ListingFilter| {
        service
            .search(filter)
            .unwrap()
            .into_iter()
            .map(|listing| listing.title)
            .collect::<Vec<_>>()
    };

    assert_eq!(titles(&ListingFilter::default()).len(), 3);
    assert_eq!(
        titles(&ListingFilter {
            query: Some("led".to_string()),
            ..ListingFilter::default()
        }),
        ["Desk lamp"]
    );
    assert_eq!(
        titles(&ListingFilter {
            categories: vec![Category::Books, Category::Electronics],
            max_price_cents: Some(1000),
            ..ListingFilter::default()
        }),
        ["USB cable"]
    );

    SqliteAccountRepository::try_new(&conn)
        .unwrap()
        .set_enabled(bob, false)
        .unwrap();
    assert!(titles(&ListingFilter {
        query: Some("usb".to_string()),
        ..ListingFilter::default()
    })
    .is_empty());
}

#[test]
fn all_listings_carry_seller_names() {
    let conn = open_db_in_memory().unwrap();
    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let accounts = SqliteAccountRepository::try_new(&conn).unwrap();
    let service = ListingService::new(SqliteListingRepository::try_new(&conn).unwrap());

    service
        .create_listing(ann, draft("Desk", Category::Furniture, 1234))
        .unwrap();
    accounts.set_enabled(ann, false).unwrap();

    let rows = service.list_all_listings(&accounts).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].seller_name, "Ann Seller");
    assert_eq!(rows[0].listing.title, "Desk");
}

#[test]
fn visible_lookup_hides_listing_of_disabled_seller() {
    let conn = open_db_in_memory().unwrap();
    let ann = seed_seller(&conn, "Ann", "ann@x.com");
    let accounts = SqliteAccountRepository::try_new(&conn).unwrap();
    let service = ListingService::new(SqliteListingRepository::try_new(&conn).unwrap());

    let desk = service
        .create_listing(ann, draft("Desk", Category::Furniture, 1234))
        .unwrap();
    assert_eq!(service.get_visible_listing(desk.id).unwrap(), Some(desk.clone()));

    accounts.set_enabled(ann, false).unwrap();
    assert!(service.get_visible_listing(desk.id).unwrap().is_none());
    assert!(service.get_listing(desk.id).unwrap().is_some());
    assert!(service.get_visible_listing(desk.id + 1).unwrap().is_none());

    accounts.set_enabled(ann, true).unwrap();
    assert_eq!(service.get_visible_listing(desk.id).unwrap(), Some(desk));
}
