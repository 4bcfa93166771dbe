//! Account use-case service.
//!
//! # Responsibility
//! - Registration, login, profile edits and administrator moderation.
//! - Start a [`Session`] for every successful login.
//!
//! # Invariants
//! - Emails are normalized before every write and lookup.
//! - Login failure is `Ok(None)` with no reason attached.
//! - Administrator login verifies the password; the email domain rule is
//!   an extra gate, not a substitute.

use crate::credential::hash_password;
use crate::model::account::{
    normalize_email, Account, AccountId, AccountValidationError, NewAccount, Role,
};
use crate::repo::account_repo::AccountRepository;
use crate::repo::{RepoError, RepoResult};
use crate::service::session::Session;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Email domain required for administrator accounts.
pub const ADMIN_EMAIL_DOMAIN: &str = "@mavmart.com";

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountServiceError {
    /// Field-level input problem.
    InvalidInput(AccountValidationError),
    /// Another account already uses this email.
    EmailTaken(String),
    /// Administrator email outside [`ADMIN_EMAIL_DOMAIN`].
    AdminDomainRequired(String),
    AccountNotFound(AccountId),
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for AccountServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::EmailTaken(email) => write!(f, "email already registered: {email}"),
            Self::AdminDomainRequired(_) => {
                write!(f, "Admin email should end with {ADMIN_EMAIL_DOMAIN}")
            }
            Self::AccountNotFound(id) => write!(f, "account not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent account state: {details}"),
        }
    }
}

impl Error for AccountServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccountServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidAccount(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

/// Profile edit input. `new_password = None` keeps the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub new_password: Option<String>,
}

/// Account service facade over repository implementations.
pub struct AccountService<R: AccountRepository> {
    repo: R,
}

impl<R: AccountRepository> AccountService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a regular user and returns the stored account.
    pub fn register(&self, account: NewAccount) -> Result<Account, AccountServiceError> {
        let mut account = account.normalized();
        account.role = Role::RegularUser;
        self.insert(account)
    }

    /// Provisions an administrator; the email must be in the admin domain.
    pub fn register_admin(&self, account: NewAccount) -> Result<Account, AccountServiceError> {
        let mut account = account.normalized();
        ensure_admin_domain(&account.email)?;
        account.role = Role::Administrator;
        self.insert(account)
    }

    /// Logs in a regular user and starts a session with an empty cart.
    pub fn login_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, AccountServiceError> {
        self.login(email, password, Role::RegularUser)
    }

    /// Logs in an administrator.
    ///
    /// # Errors
    /// - `AdminDomainRequired` when the email is outside the admin domain;
    ///   this is a format check made before any lookup.
    ///
    /// That error is an input-format error, not a login failure: rejected
    /// credentials are still `Ok(None)`.
    pub fn login_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, AccountServiceError> {
        ensure_admin_domain(&normalize_email(email))?;
        self.login(email, password, Role::Administrator)
    }

    /// Replaces names and email, optionally re-hashing a new password.
    ///
    /// Role and enabled flag are kept.
    pub fn update_profile(
        &self,
        id: AccountId,
        update: ProfileUpdate,
    ) -> Result<Account, AccountServiceError> {
        let mut account = self
            .repo
            .get_by_id(id)?
            .ok_or(AccountServiceError::AccountNotFound(id))?;

        account.first_name = update.first_name.trim().to_string();
        account.last_name = update.last_name.trim().to_string();
        account.email = normalize_email(&update.email);
        if let Some(password) = update.new_password.filter(|value| !value.is_empty()) {
            account.password_hash = hash_password(&password).map_err(RepoError::from)?;
        }

        let email = account.email.clone();
        let changed = self
            .repo
            .update(&account)
            .map_err(|err| email_conflict(err, &email))?;
        if !changed {
            return Err(AccountServiceError::AccountNotFound(id));
        }
        info!("event=account_update module=service status=ok account_id={id}");

        self.repo
            .get_by_id(id)?
            .ok_or(AccountServiceError::InconsistentState(
                "updated account not found in read-back",
            ))
    }

    pub fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        self.repo.get_by_id(id)
    }

    /// Every account for the administrator dashboard.
    pub fn list_accounts(&self) -> RepoResult<Vec<Account>> {
        self.repo.get_all()
    }

    /// Enables or disables an account. Disabling hides its listings from buyers.
    pub fn set_account_enabled(
        &self,
        id: AccountId,
        enabled: bool,
    ) -> Result<(), AccountServiceError> {
        if !self.repo.set_enabled(id, enabled)? {
            return Err(AccountServiceError::AccountNotFound(id));
        }
        info!("event=account_set_enabled module=service status=ok account_id={id} enabled={enabled}");
        Ok(())
    }

    fn insert(&self, account: NewAccount) -> Result<Account, AccountServiceError> {
        let id = self
            .repo
            .create(&account)
            .map_err(|err| email_conflict(err, &account.email))?;
        info!(
            "event=account_register module=service status=ok account_id={} role={:?}",
            id, account.role
        );

        self.repo
            .get_by_id(id)?
            .ok_or(AccountServiceError::InconsistentState(
                "created account not found in read-back",
            ))
    }

    fn login(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Option<Session>, AccountServiceError> {
        let email = normalize_email(email);
        match self.repo.validate_login(&email, password, Some(role))? {
            Some(account) => {
                info!(
                    "event=login module=service status=ok account_id={} role={:?}",
                    account.id, role
                );
                Ok(Some(Session::new(account)))
            }
            None => {
                warn!("event=login module=service status=rejected role={role:?}");
                Ok(None)
            }
        }
    }
}

fn ensure_admin_domain(email: &str) -> Result<(), AccountServiceError> {
    if email.ends_with(ADMIN_EMAIL_DOMAIN) {
        Ok(())
    } else {
        Err(AccountServiceError::AdminDomainRequired(email.to_string()))
    }
}

fn email_conflict(err: RepoError, email: &str) -> AccountServiceError {
    match err {
        RepoError::ConstraintViolation(_) => AccountServiceError::EmailTaken(email.to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_admin_domain, AccountServiceError};

    #[test]
    fn admin_domain_is_suffix_match() {
        assert!(ensure_admin_domain("root@mavmart.com").is_ok());
        assert!(matches!(
            ensure_admin_domain("root@mavmart.co"),
            Err(AccountServiceError::AdminDomainRequired(_))
        ));
        assert!(ensure_admin_domain("root@gmail.com").is_err());
    }
}
