//! Payment-field format checks used to gate order placement.
//!
//! These are pure functions: they never touch storage or the cart ledger.
//! The date used for expiry checks is injected so results are reproducible.

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EXPIRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<month>0[1-9]|1[0-2])/(?P<year>[0-9]{2})$").expect("valid expiry regex")
});

const CARD_NUMBER_DIGITS: usize = 16;
const CVC_DIGITS: usize = 3;

/// Field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutFieldError {
    CardNumber,
    Expiry,
    Cvc,
}

impl Display for CheckoutFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CardNumber => write!(f, "Card number must be 16 digits"),
            Self::Expiry => write!(f, "Invalid expiry date (MM/YY)"),
            Self::Cvc => write!(f, "CVC must be 3 digits"),
        }
    }
}

impl Error for CheckoutFieldError {}

/// Accepts exactly 16 digits once spaces, dashes and other non-digits are removed.
pub fn validate_card_number(text: &str) -> Result<(), CheckoutFieldError> {
    let digits = text.chars().filter(char::is_ascii_digit).count();
    if digits == CARD_NUMBER_DIGITS {
        Ok(())
    } else {
        Err(CheckoutFieldError::CardNumber)
    }
}

/// Accepts `MM/YY` whose month is not strictly before `today`'s month.
pub fn validate_expiry(text: &str, today: NaiveDate) -> Result<(), CheckoutFieldError> {
    let caps = EXPIRY_RE
        .captures(text)
        .ok_or(CheckoutFieldError::Expiry)?;
    let month: u32 = caps["month"]
        .parse()
        .map_err(|_| CheckoutFieldError::Expiry)?;
    let year: i32 = caps["year"]
        .parse::<i32>()
        .map(|short| 2000 + short)
        .map_err(|_| CheckoutFieldError::Expiry)?;

    if (year, month) < (today.year(), today.month()) {
        return Err(CheckoutFieldError::Expiry);
    }
    Ok(())
}

/// The local calendar date that expiry checks compare against.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// [`validate_expiry`] against [`local_today`].
pub fn validate_expiry_now(text: &str) -> Result<(), CheckoutFieldError> {
    validate_expiry(text, local_today())
}

/// Accepts exactly three ASCII digits, nothing else.
pub fn validate_cvc(text: &str) -> Result<(), CheckoutFieldError> {
    if text.len() == CVC_DIGITS && text.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CheckoutFieldError::Cvc)
    }
}

/// Raw payment form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentDetails {
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}

/// Every failing field, in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentValidationErrors(pub Vec<CheckoutFieldError>);

impl PaymentValidationErrors {
    pub fn contains(&self, field: CheckoutFieldError) -> bool {
        self.0.contains(&field)
    }
}

impl Display for PaymentValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl Error for PaymentValidationErrors {}

impl PaymentDetails {
    /// Runs all three checks and reports every failing field.
    pub fn validate(&self, today: NaiveDate) -> Result<(), PaymentValidationErrors> {
        let failures: Vec<CheckoutFieldError> = [
            validate_card_number(&self.card_number),
            validate_expiry(&self.expiry, today),
            validate_cvc(&self.cvc),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PaymentValidationErrors(failures))
        }
    }
}
