//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own input normalization (trimmed names, lowercase email).
//! - Keep presentation callers decoupled from storage details.

pub mod account_service;
pub mod listing_service;
pub mod session;
