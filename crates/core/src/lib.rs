//! Marketstall Core - Shared types library.
//!
//! This crate provides the domain newtypes used across all Marketstall components:
//! - `api` - The REST backend (catalog, cart, orders, accounts)
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Database encoding is opt-in through the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, usernames, roles and money amounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
