use mavmart_core::db::migrations::{latest_version, RESET_CUTOFF_VERSION};
use mavmart_core::db::{open_db, open_db_in_memory, DbError};
use mavmart_core::{
    AccountRepository, ListingRepository, RepoError, SqliteAccountRepository,
    SqliteListingRepository,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_latest_layout() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(latest_version(), 7);
    assert_table_exists(&conn, "accounts");
    assert_table_exists(&conn, "listings");
    assert!(column_exists(&conn, "accounts", "enabled"));
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mavmart.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO accounts (first_name, last_name, email, password_hash, role)
             VALUES ('Ann', 'Lee', 'ann@x.com', 'h', 'regular_user');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_eq!(row_count(&conn_second, "accounts"), 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn store_older_than_reset_cutoff_is_recreated_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE accounts (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO accounts (name) VALUES ('legacy');
         CREATE TABLE listings (id INTEGER PRIMARY KEY, title TEXT);
         INSERT INTO listings (title) VALUES ('legacy');
         PRAGMA user_version = 5;",
    )
    .unwrap();
    drop(conn);
    assert!(5 < RESET_CUTOFF_VERSION);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(row_count(&conn, "accounts"), 0);
    assert_eq!(row_count(&conn, "listings"), 0);
    assert!(column_exists(&conn, "accounts", "enabled"));
    assert!(column_exists(&conn, "accounts", "password_hash"));
    SqliteAccountRepository::try_new(&conn).unwrap();
}

#[test]
fn version_six_store_keeps_rows_and_gains_enabled_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v6.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0006_reset.sql"))
        .unwrap();
    conn.execute_batch(
        "INSERT INTO accounts (first_name, last_name, email, password_hash, role)
         VALUES ('Ann', 'Lee', 'ann@x.com', 'h', 'regular_user');
         INSERT INTO listings (seller_id, title, category, price_cents, condition, status, created_at)
         VALUES (1, 'Desk', 'furniture', 1234, 'good', 'active', 10);
         PRAGMA user_version = 6;",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), 7);

    let accounts = SqliteAccountRepository::try_new(&conn).unwrap();
    let ann = accounts.get_by_id(1).unwrap().unwrap();
    assert!(ann.enabled);

    let listings = SqliteListingRepository::try_new(&conn).unwrap();
    let visible = listings.get_all_visible().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "Desk");
}

#[test]
fn repositories_reject_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let account_err = SqliteAccountRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        account_err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
    let listing_err = SqliteListingRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        listing_err,
        RepoError::UninitializedConnection { .. }
    ));
}

#[test]
fn repositories_reject_connection_missing_enabled_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0006_reset.sql"))
        .unwrap();
    conn.execute_batch("PRAGMA user_version = 7;").unwrap();

    let err = SqliteAccountRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::MissingRequiredColumn {
            table: "accounts",
            column: "enabled"
        }
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names.iter().any(|name| name == column)
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}
