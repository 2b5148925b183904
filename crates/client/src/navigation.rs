//! Route changes mapped into coordinator requests.
//!
//! The binding derives a [`ResourceKey`] from every navigation event
//! and forwards it to the coordinator unconditionally, relying on the
//! coordinator's own idempotence guard instead of tracking a "last
//! key" locally - a locally cached key and the coordinator's internal
//! state can disagree, the guard cannot.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use bloomcart_core::ResourceKey;

use crate::coordinator::RequestCoordinator;
use crate::fetch::Fetcher;

/// A navigation event: the route the user is currently on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    /// Decoded query pairs in order of appearance.
    pub query: Vec<(String, String)>,
}

impl Location {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Derive the resource key for a location. Pure and deterministic.
///
/// A `category` query parameter wins; otherwise a `/category/<slug>`
/// path segment; otherwise the full catalog.
#[must_use]
pub fn derive_key(location: &Location) -> ResourceKey {
    if let Some(slug) = location.query_param("category") {
        return ResourceKey::from_category(Some(slug));
    }

    let slug = location
        .path
        .strip_prefix("/category/")
        .map(|rest| rest.split('/').next().unwrap_or(rest));
    ResourceKey::from_category(slug)
}

/// Drives a [`RequestCoordinator`] from a stream of navigation events.
///
/// Requests for the current location immediately, then for every
/// change. Dropping the binding (unmount) cancels the coordinator so
/// no orphaned request can later mutate state no one is listening to.
pub struct NavigationBinding<T: Clone + Send + 'static> {
    coordinator: RequestCoordinator<T>,
    task: JoinHandle<()>,
}

impl<T> NavigationBinding<T>
where
    T: Clone + Send + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        mut locations: watch::Receiver<Location>,
        coordinator: RequestCoordinator<T>,
        fetcher: Arc<dyn Fetcher<T>>,
    ) -> Self {
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move {
                let key = derive_key(&locations.borrow_and_update());
                coordinator.request(key, Arc::clone(&fetcher));

                while locations.changed().await.is_ok() {
                    let key = derive_key(&locations.borrow_and_update());
                    debug!(%key, "navigation change");
                    coordinator.request(key, Arc::clone(&fetcher));
                }

                // route source dropped; nothing further can arrive
                debug!("navigation source closed");
                coordinator.cancel();
            }
        });

        Self { coordinator, task }
    }

    /// Tear the binding down explicitly (equivalent to dropping it).
    pub fn shutdown(self) {
        drop(self);
    }
}

impl<T: Clone + Send + 'static> Drop for NavigationBinding<T> {
    fn drop(&mut self) {
        self.task.abort();
        self.coordinator.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use crate::coordinator::FetchStatus;
    use crate::error::FetchError;

    #[test]
    fn test_derive_key_query_param() {
        let location = Location::new("/products").with_query("category", "roses");
        assert_eq!(derive_key(&location), ResourceKey::Category("roses".to_owned()));
    }

    #[test]
    fn test_derive_key_query_wins_over_path() {
        let location = Location::new("/category/tulips").with_query("category", "roses");
        assert_eq!(derive_key(&location), ResourceKey::Category("roses".to_owned()));
    }

    #[test]
    fn test_derive_key_path_segment() {
        let location = Location::new("/category/tulips/view");
        assert_eq!(derive_key(&location), ResourceKey::Category("tulips".to_owned()));
    }

    #[test]
    fn test_derive_key_sentinels() {
        assert_eq!(derive_key(&Location::new("/")), ResourceKey::AllProducts);
        assert_eq!(
            derive_key(&Location::new("/products").with_query("category", "all")),
            ResourceKey::AllProducts
        );
    }

    /// Immediate fetcher that records which keys it was asked for.
    struct RecordingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher<String> for RecordingFetcher {
        async fn fetch(
            &self,
            key: &ResourceKey,
            _abort: CancellationToken,
        ) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(key.to_string())
        }
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_binding_requests_current_then_changes() {
        let (tx, rx) = watch::channel(Location::new("/").with_query("category", "roses"));
        let coordinator = RequestCoordinator::new();
        let fetcher = Arc::new(RecordingFetcher {
            calls: AtomicUsize::new(0),
        });

        let binding = NavigationBinding::spawn(
            rx,
            coordinator.clone(),
            Arc::clone(&fetcher) as Arc<dyn Fetcher<String>>,
        );
        settle().await;
        assert_eq!(coordinator.state().data.as_deref(), Some("roses"));

        tx.send(Location::new("/").with_query("category", "tulips"))
            .expect("receiver alive");
        settle().await;
        assert_eq!(coordinator.state().key, Some(ResourceKey::Category("tulips".to_owned())));
        assert_eq!(coordinator.state().data.as_deref(), Some("tulips"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

        binding.shutdown();
        settle().await;
        assert_eq!(coordinator.state().status, FetchStatus::Idle);
    }

    #[tokio::test]
    async fn test_binding_cancels_when_source_closes() {
        let (tx, rx) = watch::channel(Location::new("/"));
        let coordinator = RequestCoordinator::new();
        let fetcher = Arc::new(RecordingFetcher {
            calls: AtomicUsize::new(0),
        });

        let _binding = NavigationBinding::spawn(
            rx,
            coordinator.clone(),
            Arc::clone(&fetcher) as Arc<dyn Fetcher<String>>,
        );
        settle().await;
        assert_eq!(coordinator.state().status, FetchStatus::Success);

        drop(tx);
        settle().await;
        assert_eq!(coordinator.state().status, FetchStatus::Idle);
    }
}
