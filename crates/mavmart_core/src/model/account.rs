//! Account domain model.
//!
//! # Responsibility
//! - Define registered identities (regular users and administrators).
//! - Normalize and validate registration/profile input.
//!
//! # Invariants
//! - `email` is unique across accounts; callers store the normalized form.
//! - `password_hash` is a PHC string, never the raw password.
//! - Accounts are never hard-deleted; `enabled = false` is the off switch.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable account identifier assigned by storage.
pub type AccountId = i64;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    RegularUser,
    Administrator,
}

/// Persisted account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Never serialized to outer layers.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub enabled: bool,
}

impl Account {
    /// Human-readable "First Last" label.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    /// Validates fields that a full-row update writes.
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        validate_identity(&self.first_name, &self.last_name, &self.email)?;
        if self.password_hash.is_empty() {
            return Err(AccountValidationError::EmptyPassword);
        }
        Ok(())
    }
}

/// Registration input. `password` is hashed by the repository on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewAccount {
    /// Creates a regular-user registration.
    pub fn regular(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: password.into(),
            role: Role::RegularUser,
        }
    }

    /// Trims names and normalizes email; the password is kept verbatim.
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }

    pub fn validate(&self) -> Result<(), AccountValidationError> {
        validate_identity(&self.first_name, &self.last_name, &self.email)?;
        if self.password.is_empty() {
            return Err(AccountValidationError::EmptyPassword);
        }
        Ok(())
    }
}

/// Canonical email form used for storage and lookup.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyFirstName,
    EmptyLastName,
    InvalidEmail(String),
    EmptyPassword,
}

impl Display for AccountValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::EmptyLastName => write!(f, "last name must not be empty"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl Error for AccountValidationError {}

fn validate_identity(
    first_name: &str,
    last_name: &str,
    email: &str,
) -> Result<(), AccountValidationError> {
    if first_name.trim().is_empty() {
        return Err(AccountValidationError::EmptyFirstName);
    }
    if last_name.trim().is_empty() {
        return Err(AccountValidationError::EmptyLastName);
    }
    let email = email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !well_formed {
        return Err(AccountValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, AccountValidationError, NewAccount, Role};

    #[test]
    fn normalized_trims_and_lowercases() {
        let account = NewAccount::regular("  Ann ", "Lee ", " Ann@X.com ", " p1 ").normalized();
        assert_eq!(account.first_name, "Ann");
        assert_eq!(account.last_name, "Lee");
        assert_eq!(account.email, "ann@x.com");
        assert_eq!(account.password, " p1 ");
        assert_eq!(account.role, Role::RegularUser);
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut account = NewAccount::regular("Ann", "Lee", "ann@x.com", "p1");
        assert!(account.validate().is_ok());

        account.email = "not-an-email".to_string();
        assert!(matches!(
            account.validate(),
            Err(AccountValidationError::InvalidEmail(_))
        ));

        account.email = "ann@x.com".to_string();
        account.password.clear();
        assert_eq!(
            account.validate(),
            Err(AccountValidationError::EmptyPassword)
        );

        account.first_name = "   ".to_string();
        assert_eq!(
            account.validate(),
            Err(AccountValidationError::EmptyFirstName)
        );
    }

    #[test]
    fn normalize_email_is_idempotent() {
        let once = normalize_email(" Bob@Example.COM");
        assert_eq!(normalize_email(&once), once);
    }
}
