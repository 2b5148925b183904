//! Single-flight, cancellation-aware fetch coordination.
//!
//! A [`RequestCoordinator`] owns at most one in-flight fetch at a time
//! and guarantees that committed state only ever reflects the most
//! recently requested key. Staleness is decided by a monotonically
//! increasing request id captured when the fetch is issued and compared
//! when it resolves; correctness never depends on the transport
//! honoring the abort signal, only on it eventually settling.
//!
//! Coordinators are explicit owned instances (one per screen or
//! navigation context), cheaply cloneable, and safe to drop while a
//! fetch is outstanding: the orphaned resolution finds its id no longer
//! live and is discarded.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use bloomcart_core::ResourceKey;

use crate::error::{ErrorInfo, FetchError};
use crate::fetch::Fetcher;

/// Lifecycle of the coordinated fetch.
///
/// `Idle -> Loading -> {Success, Error}`; `Loading -> Idle` via
/// [`RequestCoordinator::cancel`] or a live fetch resolving aborted,
/// and any state returns to `Loading` on a new request. There is no
/// automatic retry: retrying is always an explicit new `request()` from
/// the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of the coordinator's committed state.
#[derive(Debug, Clone)]
pub struct FetchState<T> {
    /// The key the state currently belongs to.
    pub key: Option<ResourceKey>,
    pub status: FetchStatus,
    /// Last committed payload. Kept through `Loading` so consumers can
    /// render stale data under a spinner.
    pub data: Option<T>,
    pub error: Option<ErrorInfo>,
    /// Increments on every accepted `request()`; the sole staleness
    /// tie-breaker.
    pub request_id: u64,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            key: None,
            status: FetchStatus::Idle,
            data: None,
            error: None,
            request_id: 0,
        }
    }
}

type Listener<T> = Arc<dyn Fn(&FetchState<T>) + Send + Sync>;

struct InFlight {
    key: ResourceKey,
    request_id: u64,
    token: CancellationToken,
}

struct CoordinatorInner<T> {
    state: FetchState<T>,
    in_flight: Option<InFlight>,
    listeners: Vec<(u64, Listener<T>)>,
    next_listener_id: u64,
}

/// Single-flight fetch coordinator with staleness guarding.
pub struct RequestCoordinator<T> {
    inner: Arc<Mutex<CoordinatorInner<T>>>,
}

impl<T> Clone for RequestCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RequestCoordinator<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestCoordinator<T>
where
    T: Clone + Send + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CoordinatorInner {
                state: FetchState::default(),
                in_flight: None,
                listeners: Vec::new(),
                next_listener_id: 0,
            })),
        }
    }

    /// Issue a fetch for `key`, superseding any in-flight request.
    ///
    /// Re-entry guard: if a fetch for this exact key is already in
    /// flight, the call is a no-op and `fetcher` is not invoked. This
    /// absorbs double-taps and repeated navigation events without the
    /// caller tracking a "last key" of its own.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request(&self, key: ResourceKey, fetcher: Arc<dyn Fetcher<T>>) {
        let (request_id, token) = {
            let mut inner = self.lock();

            if inner.in_flight.as_ref().is_some_and(|f| f.key == key) {
                debug!(%key, "request ignored, fetch for key already in flight");
                return;
            }

            if let Some(superseded) = inner.in_flight.take() {
                debug!(key = %superseded.key, "superseding in-flight request");
                superseded.token.cancel();
            }

            inner.state.request_id += 1;
            inner.state.status = FetchStatus::Loading;
            inner.state.key = Some(key.clone());
            inner.state.error = None;

            let token = CancellationToken::new();
            inner.in_flight = Some(InFlight {
                key: key.clone(),
                request_id: inner.state.request_id,
                token: token.clone(),
            });
            (inner.state.request_id, token)
        };

        self.notify();

        let coordinator = self.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(&key, token).await;
            coordinator.resolve(request_id, result);
        });
    }

    /// Abort the active request (if any) and reset to `Idle`.
    ///
    /// Clears `data` and `error` but keeps `key`. A resolution arriving
    /// after cancellation is discarded.
    pub fn cancel(&self) {
        let changed = {
            let mut inner = self.lock();
            let flight = inner.in_flight.take();
            if let Some(flight) = &flight {
                flight.token.cancel();
            }

            if flight.is_none() && inner.state.status == FetchStatus::Idle {
                false
            } else {
                inner.state.status = FetchStatus::Idle;
                inner.state.data = None;
                inner.state.error = None;
                true
            }
        };

        if changed {
            self.notify();
        }
    }

    /// Snapshot of the current committed state.
    #[must_use]
    pub fn state(&self) -> FetchState<T> {
        self.lock().state.clone()
    }

    /// Register a listener invoked on every committed state transition.
    ///
    /// Discarded (stale, superseded, or canceled) resolutions never
    /// notify. Dropping the returned [`Subscription`] deregisters the
    /// listener.
    pub fn subscribe(
        &self,
        listener: impl Fn(&FetchState<T>) + Send + Sync + 'static,
    ) -> Subscription<T> {
        let mut inner = self.lock();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        Subscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Commit or discard a fetch resolution.
    ///
    /// Commits iff `request_id` is still the live in-flight id; a
    /// canceled or superseded flight is no longer live, so its
    /// resolution cannot mutate state regardless of completion order.
    fn resolve(&self, request_id: u64, result: Result<T, FetchError>) {
        {
            let mut inner = self.lock();

            if inner.in_flight.as_ref().map(|f| f.request_id) != Some(request_id) {
                debug!(request_id, "discarding stale resolution");
                return;
            }

            inner.in_flight = None;

            match result {
                Err(FetchError::Aborted) => {
                    // The transport gave up on its own; reset like a
                    // cancellation rather than surfacing an error, so
                    // the consumer is never stuck on `Loading`.
                    debug!(request_id, "fetch aborted, resetting to idle");
                    inner.state.status = FetchStatus::Idle;
                    inner.state.data = None;
                    inner.state.error = None;
                }
                Ok(data) => {
                    inner.state.status = FetchStatus::Success;
                    inner.state.data = Some(data);
                    inner.state.error = None;
                }
                Err(error) => {
                    inner.state.status = FetchStatus::Error;
                    inner.state.error = Some(ErrorInfo::from_fetch(&error));
                }
            }
        }

        self.notify();
    }

    fn notify(&self) {
        let (state, listeners) = {
            let inner = self.lock();
            let listeners: Vec<Listener<T>> = inner
                .listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            (inner.state.clone(), listeners)
        };

        // Invoked outside the lock so listeners may call back into the
        // coordinator.
        for listener in listeners {
            listener(&state);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CoordinatorInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Listener registration handle; dropping it unsubscribes.
pub struct Subscription<T> {
    inner: std::sync::Weak<Mutex<CoordinatorInner<T>>>,
    id: u64,
}

impl<T> Subscription<T> {
    /// Explicitly deregister the listener.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
