//! Shared type definitions.
//!
//! - [`id`] - Newtype wrappers for product and owner identifiers
//! - [`key`] - [`ResourceKey`] identifying what a fetch targets
//! - [`price`] - Decimal-backed price type
//! - [`product`] - Raw wire shape and the normalized favorite record

pub mod id;
pub mod key;
pub mod price;
pub mod product;

pub use id::{OwnerId, ProductId};
pub use key::ResourceKey;
pub use price::Price;
pub use product::{FavoriteRecord, RawImage, RawProduct};
