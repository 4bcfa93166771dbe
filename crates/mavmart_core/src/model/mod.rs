//! Catalog domain model.
//!
//! # Responsibility
//! - Define the plain values exchanged with the presentation layer.
//! - Hold field-level validation rules shared by repositories and services.
//!
//! # Invariants
//! - Every persisted object is identified by a stable integer id.
//! - Money is always integer minor units (cents).

pub mod account;
pub mod listing;
pub mod money;
