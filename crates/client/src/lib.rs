//! Bloomcart client synchronization layer.
//!
//! Everything here exists to keep client state correct under
//! concurrent, user-driven async operations:
//!
//! - [`coordinator`] - single-flight catalog fetches with staleness
//!   guarding: a late response from an abandoned request never
//!   overwrites newer state
//! - [`favorites`] - normalized, deduplicated, persisted favorites
//!   that stay consistent under rapid toggles and failing storage
//! - [`navigation`] - route changes mapped into coordinator requests
//! - [`toggle`] - UI toggle gestures mapped into favorites mutations
//! - [`fetch`] - the abortable fetch seam and its `reqwest`-backed
//!   catalog implementation
//! - [`storage`] - the persistent key-value seam (file-backed and
//!   in-memory)
//!
//! # Example
//!
//! ```rust,ignore
//! use bloomcart_client::{ClientConfig, ClientState};
//! use bloomcart_core::OwnerId;
//!
//! let config = ClientConfig::from_env()?;
//! let state = ClientState::new(config, OwnerId::guest())?;
//!
//! // drive the catalog from navigation events
//! let binding = state.bind_navigation(locations);
//!
//! // toggle a favorite from a UI payload
//! state.toggles().apply(&payload);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod navigation;
pub mod state;
pub mod storage;
pub mod toggle;

pub use config::{ClientConfig, ConfigError};
pub use coordinator::{FetchState, FetchStatus, RequestCoordinator, Subscription};
pub use error::{ErrorInfo, FetchError, PersistenceError};
pub use favorites::{FavoritesStore, FavoritesSubscription, MutationOutcome};
pub use fetch::{CatalogFetcher, Fetcher, fetcher_fn};
pub use navigation::{Location, NavigationBinding, derive_key};
pub use state::ClientState;
pub use storage::{FileKv, KvStore, MemoryKv};
pub use toggle::ToggleReducer;
