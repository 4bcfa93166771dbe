//! Account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and lookup APIs over `accounts` storage.
//! - Verify claimed credentials against stored password hashes.
//!
//! # Invariants
//! - Write paths validate input before SQL mutations.
//! - `validate_login` never mutates and never says why it failed.
//! - Listing order for `get_all` is first then last name, case-insensitive.

use crate::credential::{hash_password, verify_password};
use crate::model::account::{Account, AccountId, NewAccount, Role};
use crate::repo::{bool_to_int, ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    email,
    password_hash,
    role,
    enabled
FROM accounts";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "email",
    "password_hash",
    "role",
    "enabled",
];

/// Repository interface for account operations.
pub trait AccountRepository {
    /// Hashes the password and inserts an enabled account.
    fn create(&self, account: &NewAccount) -> RepoResult<AccountId>;
    /// Lists every account, enabled or not.
    fn get_all(&self) -> RepoResult<Vec<Account>>;
    fn get_by_id(&self, id: AccountId) -> RepoResult<Option<Account>>;
    /// Exact match on the stored email value.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>>;
    /// Replaces all mutable fields. Returns `false` when the id is gone.
    fn update(&self, account: &Account) -> RepoResult<bool>;
    /// Sets only the enabled flag. Returns `false` when the id is gone.
    fn set_enabled(&self, id: AccountId, enabled: bool) -> RepoResult<bool>;
    /// Returns the account only if it exists, is enabled, the password
    /// verifies and (when given) the role matches.
    fn validate_login(
        &self,
        email: &str,
        password: &str,
        expected_role: Option<Role>,
    ) -> RepoResult<Option<Account>>;
}

/// SQLite-backed account repository.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "accounts", REQUIRED_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn create(&self, account: &NewAccount) -> RepoResult<AccountId> {
        account.validate()?;
        let password_hash = hash_password(&account.password)?;

        self.conn.execute(
            "INSERT INTO accounts (
                first_name,
                last_name,
                email,
                password_hash,
                role,
                enabled
            ) VALUES (?1, ?2, ?3, ?4, ?5, 1);",
            params![
                account.first_name.as_str(),
                account.last_name.as_str(),
                account.email.as_str(),
                password_hash,
                role_to_db(account.role),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_all(&self) -> RepoResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACCOUNT_SELECT_SQL}
             ORDER BY first_name COLLATE NOCASE ASC, last_name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut accounts = Vec::new();
        while let Some(row) = rows.next()? {
            accounts.push(parse_account_row(row)?);
        }
        Ok(accounts)
    }

    fn get_by_id(&self, id: AccountId) -> RepoResult<Option<Account>> {
        self.query_one(&format!("{ACCOUNT_SELECT_SQL} WHERE id = ?1;"), params![id])
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        self.query_one(
            &format!("{ACCOUNT_SELECT_SQL} WHERE email = ?1;"),
            params![email],
        )
    }

    fn update(&self, account: &Account) -> RepoResult<bool> {
        account.validate()?;

        let changed = self.conn.execute(
            "UPDATE accounts
             SET
                first_name = ?1,
                last_name = ?2,
                email = ?3,
                password_hash = ?4,
                role = ?5,
                enabled = ?6
             WHERE id = ?7;",
            params![
                account.first_name.as_str(),
                account.last_name.as_str(),
                account.email.as_str(),
                account.password_hash.as_str(),
                role_to_db(account.role),
                bool_to_int(account.enabled),
                account.id,
            ],
        )?;

        Ok(changed > 0)
    }

    fn set_enabled(&self, id: AccountId, enabled: bool) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE accounts SET enabled = ?1 WHERE id = ?2;",
            params![bool_to_int(enabled), id],
        )?;
        Ok(changed > 0)
    }

    fn validate_login(
        &self,
        email: &str,
        password: &str,
        expected_role: Option<Role>,
    ) -> RepoResult<Option<Account>> {
        let Some(account) = self.find_by_email(email)? else {
            return Ok(None);
        };
        if !account.enabled {
            return Ok(None);
        }
        if !verify_password(password, &account.password_hash) {
            return Ok(None);
        }
        if expected_role.is_some_and(|role| role != account.role) {
            return Ok(None);
        }
        Ok(Some(account))
    }
}

impl SqliteAccountRepository<'_> {
    fn query_one(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Option<Account>> {
        let mut stmt = self.conn.prepare(sql)?;
        let row = stmt
            .query_row(params, |row| Ok(parse_account_row(row)))
            .optional()?;
        row.transpose()
    }
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let role_text: String = row.get("role")?;
    let role = parse_role(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in accounts.role"))
    })?;

    let enabled = match row.get::<_, i64>("enabled")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid enabled value `{other}` in accounts.enabled"
            )));
        }
    };

    Ok(Account {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role,
        enabled,
    })
}

fn role_to_db(role: Role) -> &'static str {
    match role {
        Role::RegularUser => "regular_user",
        Role::Administrator => "administrator",
    }
}

fn parse_role(value: &str) -> Option<Role> {
    match value {
        "regular_user" => Some(Role::RegularUser),
        "administrator" => Some(Role::Administrator),
        _ => None,
    }
}
