//! Login session with its cart.
//!
//! # Responsibility
//! - Bind the logged-in account to its own cart ledger.
//! - Gate order placement on payment validation.
//!
//! # Invariants
//! - A session exists only after a successful login.
//! - The cart lives exactly as long as the session; logout discards it.
//! - Sellers cannot stage their own listings.

use crate::cart::{CartItem, CartItemId, CartLedger};
use crate::checkout::{PaymentDetails, PaymentValidationErrors};
use crate::model::account::{Account, AccountId};
use crate::model::listing::{Listing, ListingId};
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum SessionError {
    OwnListing(ListingId),
    EmptyCart,
    Payment(PaymentValidationErrors),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnListing(id) => write!(f, "cannot add own listing {id} to cart"),
            Self::EmptyCart => write!(f, "cart is empty"),
            Self::Payment(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Payment(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PaymentValidationErrors> for SessionError {
    fn from(value: PaymentValidationErrors) -> Self {
        Self::Payment(value)
    }
}

/// Result of a placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub total_cents: i64,
    pub item_count: u64,
    /// Snapshot of what was bought.
    pub items: Vec<CartItem>,
}

/// Active login: the account plus its staged purchase.
#[derive(Debug)]
pub struct Session {
    account: Account,
    cart: CartLedger,
}

impl Session {
    /// Starts a session with an empty cart.
    pub fn new(account: Account) -> Self {
        Self {
            account,
            cart: CartLedger::new(),
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn account_id(&self) -> AccountId {
        self.account.id
    }

    /// Stages a snapshot of `listing`.
    pub fn add_to_cart(
        &mut self,
        listing: &Listing,
        quantity: i32,
    ) -> Result<CartItemId, SessionError> {
        if listing.seller_id == self.account.id {
            return Err(SessionError::OwnListing(listing.id));
        }
        Ok(self.cart.add(self.account.id, listing, quantity))
    }

    pub fn set_cart_quantity(&mut self, item_id: CartItemId, quantity: i32) {
        self.cart.set_quantity(self.account.id, item_id, quantity);
    }

    pub fn remove_from_cart(&mut self, item_id: CartItemId) {
        self.cart.remove(self.account.id, item_id);
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear(self.account.id);
    }

    pub fn cart_items(&self) -> &[CartItem] {
        self.cart.items(self.account.id)
    }

    pub fn cart_total_cents(&self) -> i64 {
        self.cart.total_minor_units(self.account.id)
    }

    pub fn cart_item_count(&self) -> u64 {
        self.cart.item_count(self.account.id)
    }

    /// Validates payment and empties the cart into a receipt.
    ///
    /// On any error the cart is left untouched.
    pub fn place_order(
        &mut self,
        payment: &PaymentDetails,
        today: NaiveDate,
    ) -> Result<OrderReceipt, SessionError> {
        if self.cart.is_empty(self.account.id) {
            return Err(SessionError::EmptyCart);
        }
        payment.validate(today)?;

        let receipt = OrderReceipt {
            total_cents: self.cart_total_cents(),
            item_count: self.cart_item_count(),
            items: self.cart_items().to_vec(),
        };
        self.clear_cart();
        info!(
            "event=order_place module=session status=ok account_id={} items={} total_cents={}",
            self.account.id, receipt.item_count, receipt.total_cents
        );
        Ok(receipt)
    }

    /// Ends the session, dropping the cart.
    pub fn logout(self) -> Account {
        info!(
            "event=logout module=session status=ok account_id={}",
            self.account.id
        );
        self.account
    }
}
