//! Client state shared across screens.

use std::sync::Arc;

use tokio::sync::watch;

use bloomcart_core::{OwnerId, RawProduct};

use crate::config::ClientConfig;
use crate::coordinator::RequestCoordinator;
use crate::error::PersistenceError;
use crate::favorites::FavoritesStore;
use crate::fetch::{CatalogFetcher, Fetcher};
use crate::navigation::{Location, NavigationBinding};
use crate::storage::FileKv;
use crate::toggle::ToggleReducer;

/// Shared client state: configuration, catalog coordination, and the
/// favorites store, wired together once at startup.
///
/// Cheaply cloneable via `Arc`. The catalog coordinator here is the
/// app-wide default scope; screens needing independent cancellation
/// scoping construct their own [`RequestCoordinator`].
#[derive(Clone)]
pub struct ClientState {
    inner: Arc<ClientStateInner>,
}

struct ClientStateInner {
    config: ClientConfig,
    catalog: RequestCoordinator<Vec<RawProduct>>,
    catalog_fetcher: CatalogFetcher,
    favorites: FavoritesStore,
    toggles: ToggleReducer,
}

impl ClientState {
    /// Wire up client state for `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created.
    /// A corrupt favorites snapshot is not an error; the store heals
    /// it.
    pub fn new(config: ClientConfig, owner: OwnerId) -> Result<Self, PersistenceError> {
        let kv = FileKv::open(&config.storage_dir)?;
        let favorites = FavoritesStore::load(Box::new(kv), owner);
        let toggles = ToggleReducer::new(favorites.clone());
        let catalog_fetcher = CatalogFetcher::new(&config);

        Ok(Self {
            inner: Arc::new(ClientStateInner {
                config,
                catalog: RequestCoordinator::new(),
                catalog_fetcher,
                favorites,
                toggles,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The app-wide catalog coordinator.
    #[must_use]
    pub fn catalog(&self) -> &RequestCoordinator<Vec<RawProduct>> {
        &self.inner.catalog
    }

    /// The production catalog fetcher, as a coordinator-ready handle.
    #[must_use]
    pub fn catalog_fetcher(&self) -> Arc<dyn Fetcher<Vec<RawProduct>>> {
        Arc::new(self.inner.catalog_fetcher.clone())
    }

    #[must_use]
    pub fn favorites(&self) -> &FavoritesStore {
        &self.inner.favorites
    }

    #[must_use]
    pub fn toggles(&self) -> &ToggleReducer {
        &self.inner.toggles
    }

    /// Bind the app-wide catalog coordinator to a navigation source.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn bind_navigation(
        &self,
        locations: watch::Receiver<Location>,
    ) -> NavigationBinding<Vec<RawProduct>> {
        NavigationBinding::spawn(
            locations,
            self.inner.catalog.clone(),
            self.catalog_fetcher(),
        )
    }
}
