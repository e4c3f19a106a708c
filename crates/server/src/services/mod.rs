//! Business logic services for the shop.
//!
//! # Services
//!
//! - `auth` - Password and verification-code sign-in, session tokens
//! - `email` - Verification code delivery over SMTP
//! - `purchase` - Transactional stock decrement and order creation
//! - `stats` - Cached per-user order aggregates

pub mod auth;
pub mod email;
pub mod purchase;
pub mod stats;
