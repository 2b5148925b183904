//! Integration tests for Bloomcart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bloomcart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `coordinator_staleness` - supersession, cancellation, and
//!   re-entry guarantees of the request coordinator
//! - `favorites_flow` - persisted favorites snapshots end to end,
//!   including corrupt-storage recovery on real files
//! - `navigation_sync` - navigation events driving catalog fetches,
//!   with fetched products toggled into favorites
//!
//! No external services are required: fetchers are in-process fakes
//! and storage lives under a temp directory.
