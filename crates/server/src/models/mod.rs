//! Domain models for the shop.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Serialized field names match the JSON the browser client
//! consumes.

pub mod category;
pub mod order;
pub mod product;
pub mod user;
pub mod verification_code;

pub use category::{Category, CategoryWithCount};
pub use order::{NewOrder, Order, OrderStats};
pub use product::{Product, ProductInput};
pub use user::{User, UserProfile};
pub use verification_code::VerificationCode;
