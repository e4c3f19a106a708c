//! Core types for the tea shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod customization;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use customization::{Customization, IceLevel, Sweetness};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{
    Price, PriceError, discount_percentage, effective_unit_price, normalize_discount,
};
pub use status::*;
