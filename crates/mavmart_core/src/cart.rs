//! In-memory cart ledger.
//!
//! # Responsibility
//! - Stage selected listings with quantities per account before checkout.
//! - Keep amounts stable by holding listing snapshots, not live rows.
//!
//! # Invariants
//! - Nothing here touches persistent storage; contents die with the ledger.
//! - A listing id appears at most once per account cart.
//! - Stored quantity is always >= 1; setting <= 0 removes the item.
//! - Item order is insertion order.
//! - Not synchronized: concurrent mutation needs the caller's own lock.

use crate::model::account::AccountId;
use crate::model::listing::Listing;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cart item identifier, unique within one process run.
pub type CartItemId = u64;

static NEXT_CART_ITEM_ID: AtomicU64 = AtomicU64::new(1);

fn next_cart_item_id() -> CartItemId {
    NEXT_CART_ITEM_ID.fetch_add(1, Ordering::Relaxed)
}

/// One staged line: a listing snapshot and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    /// Copy of the listing taken when it was added.
    pub listing: Listing,
    pub quantity: u32,
}

impl CartItem {
    pub fn subtotal_cents(&self) -> i64 {
        self.listing
            .price_cents
            .saturating_mul(i64::from(self.quantity))
    }
}

/// Per-account carts held for the lifetime of the owning session.
#[derive(Debug, Default)]
pub struct CartLedger {
    carts: HashMap<AccountId, Vec<CartItem>>,
}

impl CartLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `max(quantity, 1)` of `listing`, merging into an existing line.
    ///
    /// Returns the id of the new or merged item. A merge keeps the snapshot
    /// taken by the first add.
    pub fn add(&mut self, account_id: AccountId, listing: &Listing, quantity: i32) -> CartItemId {
        let quantity = clamp_quantity(quantity);
        let cart = self.carts.entry(account_id).or_default();

        if let Some(existing) = cart.iter_mut().find(|item| item.listing.id == listing.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return existing.id;
        }

        let id = next_cart_item_id();
        cart.push(CartItem {
            id,
            listing: listing.clone(),
            quantity,
        });
        id
    }

    /// Replaces an item's quantity; `quantity <= 0` removes the item.
    ///
    /// Unknown ids are ignored.
    pub fn set_quantity(&mut self, account_id: AccountId, item_id: CartItemId, quantity: i32) {
        let Some(cart) = self.carts.get_mut(&account_id) else {
            return;
        };
        let Some(index) = cart.iter().position(|item| item.id == item_id) else {
            return;
        };

        if quantity <= 0 {
            cart.remove(index);
        } else {
            cart[index].quantity = clamp_quantity(quantity);
        }
    }

    /// Removes an item if present.
    pub fn remove(&mut self, account_id: AccountId, item_id: CartItemId) {
        if let Some(cart) = self.carts.get_mut(&account_id) {
            cart.retain(|item| item.id != item_id);
        }
    }

    pub fn clear(&mut self, account_id: AccountId) {
        if let Some(cart) = self.carts.get_mut(&account_id) {
            cart.clear();
        }
    }

    /// Current contents in insertion order.
    pub fn items(&self, account_id: AccountId) -> &[CartItem] {
        self.carts
            .get(&account_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sum of snapshot price times quantity, in cents.
    pub fn total_minor_units(&self, account_id: AccountId) -> i64 {
        self.items(account_id)
            .iter()
            .fold(0_i64, |total, item| total.saturating_add(item.subtotal_cents()))
    }

    /// Sum of quantities.
    pub fn item_count(&self, account_id: AccountId) -> u64 {
        self.items(account_id)
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    pub fn is_empty(&self, account_id: AccountId) -> bool {
        self.items(account_id).is_empty()
    }
}

fn clamp_quantity(quantity: i32) -> u32 {
    u32::try_from(quantity.max(1)).unwrap_or(1)
}
