//! Bloomcart Core - Shared types library.
//!
//! This crate provides the common types used across the Bloomcart
//! client components:
//! - `client` - Catalog/favorites synchronization layer
//! - `integration-tests` - Cross-module scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! storage access. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Resource keys, product ids, prices, and the raw and
//!   normalized product shapes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
