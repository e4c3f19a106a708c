//! Tea Shop Core - Shared domain types.
//!
//! This crate provides common types used across the tea shop components:
//! - `server` - JSON API for the catalog, purchases, auth, and manager tools
//! - `cli` - Command-line tools for migrations, seeding, and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps it lightweight and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, emails, roles/statuses, and drink customization

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
