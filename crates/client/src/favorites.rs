//! Persisted, deduplicated favorites.
//!
//! The store owns normalization end to end: callers hand it raw
//! product shapes and only canonical [`FavoriteRecord`]s ever enter the
//! set or the persisted snapshot. Membership is re-derived from the
//! in-memory set under the same lock that applies the mutation and the
//! storage write, so rapid toggles on one product serialize in call
//! order and `toggle(p); toggle(p)` always lands back where it
//! started.
//!
//! A failed storage write does not roll the in-memory set back: the
//! session keeps its favorites and the failure is logged and reported
//! through [`MutationOutcome::persisted`]. Whether to retry or warn is
//! the UI's call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use bloomcart_core::{FavoriteRecord, OwnerId, ProductId, RawProduct};

use crate::storage::KvStore;

/// Result of a favorites mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Whether membership actually changed (false for duplicate adds
    /// and removes of absent ids).
    pub changed: bool,
    /// Membership of the product after the mutation.
    pub is_favorite: bool,
    /// Whether the snapshot write succeeded. `false` is advisory: the
    /// in-memory set already reflects the mutation.
    pub persisted: bool,
}

type Listener = Arc<dyn Fn(&[FavoriteRecord]) + Send + Sync>;

struct FavoritesInner {
    owner: OwnerId,
    records: HashMap<ProductId, FavoriteRecord>,
    kv: Box<dyn KvStore>,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

/// Normalized, deduplicated, persisted favorites set, scoped to one
/// owner (a signed-in user or the guest key).
#[derive(Clone)]
pub struct FavoritesStore {
    inner: Arc<Mutex<FavoritesInner>>,
}

impl FavoritesStore {
    /// Load the owner's snapshot from storage.
    ///
    /// Absent, empty, or corrupt snapshots degrade to an empty set;
    /// corrupt storage is healed by writing an empty, valid snapshot
    /// back. This path never panics.
    #[must_use]
    pub fn load(kv: Box<dyn KvStore>, owner: OwnerId) -> Self {
        let storage_key = storage_key(&owner);
        let mut records = HashMap::new();
        let mut heal = false;

        match kv.get(&storage_key) {
            None => {}
            Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(serde_json::Value::Array(entries)) => {
                    for entry in entries {
                        match serde_json::from_value::<FavoriteRecord>(entry) {
                            Ok(record) => {
                                // first occurrence wins on duplicate ids
                                if records.contains_key(&record.id) {
                                    heal = true;
                                } else {
                                    records.insert(record.id.clone(), record);
                                }
                            }
                            Err(error) => {
                                warn!(%owner, %error, "dropping unreadable favorite record");
                                heal = true;
                            }
                        }
                    }
                }
                Ok(_) | Err(_) => {
                    warn!(%owner, "favorites snapshot is not an array, resetting");
                    heal = true;
                }
            },
        }

        let mut inner = FavoritesInner {
            owner,
            records,
            kv,
            listeners: Vec::new(),
            next_listener_id: 0,
        };

        if heal {
            let _ = persist(&mut inner);
        }

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Toggle membership for a raw product.
    ///
    /// Membership is computed at call time from the in-memory set, not
    /// from any value captured earlier, so two rapid toggles apply in
    /// call order. Returns `None` when the product has no usable id.
    pub fn toggle(&self, product: &RawProduct) -> Option<MutationOutcome> {
        let outcome = {
            let mut inner = self.lock();
            let record = FavoriteRecord::normalize(product, &inner.owner)?;

            let adding = !inner.records.contains_key(&record.id);
            if adding {
                inner.records.insert(record.id.clone(), record);
            } else {
                inner.records.remove(&record.id);
            }

            let persisted = persist(&mut inner).is_ok();
            MutationOutcome {
                changed: true,
                is_favorite: adding,
                persisted,
            }
        };

        self.notify();
        Some(outcome)
    }

    /// Insert a product; no-op if its id is already present.
    ///
    /// Set semantics are enforced here, not by the caller. Returns
    /// `None` when the product has no usable id.
    pub fn add(&self, product: &RawProduct) -> Option<MutationOutcome> {
        let outcome = {
            let mut inner = self.lock();
            let record = FavoriteRecord::normalize(product, &inner.owner)?;

            if inner.records.contains_key(&record.id) {
                return Some(MutationOutcome {
                    changed: false,
                    is_favorite: true,
                    persisted: true,
                });
            }

            inner.records.insert(record.id.clone(), record);
            let persisted = persist(&mut inner).is_ok();
            MutationOutcome {
                changed: true,
                is_favorite: true,
                persisted,
            }
        };

        self.notify();
        Some(outcome)
    }

    /// Remove a product by id; no-op (not an error) if absent.
    pub fn remove(&self, id: &str) -> MutationOutcome {
        let outcome = {
            let mut inner = self.lock();
            if inner.records.remove(&ProductId::new(id)).is_none() {
                return MutationOutcome {
                    changed: false,
                    is_favorite: false,
                    persisted: true,
                };
            }

            let persisted = persist(&mut inner).is_ok();
            MutationOutcome {
                changed: true,
                is_favorite: false,
                persisted,
            }
        };

        self.notify();
        outcome
    }

    #[must_use]
    pub fn is_favorite(&self, id: &str) -> bool {
        self.lock().records.contains_key(&ProductId::new(id))
    }

    /// Snapshot of the current records. Ordering is unspecified;
    /// presentation sorts as it sees fit.
    #[must_use]
    pub fn list(&self) -> Vec<FavoriteRecord> {
        self.lock().records.values().cloned().collect()
    }

    /// The owner this store is scoped to.
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        self.lock().owner.clone()
    }

    /// Register a listener invoked after every membership change.
    ///
    /// Dropping the returned handle deregisters the listener.
    pub fn subscribe(
        &self,
        listener: impl Fn(&[FavoriteRecord]) + Send + Sync + 'static,
    ) -> FavoritesSubscription {
        let mut inner = self.lock();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        FavoritesSubscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    fn notify(&self) {
        let (records, listeners) = {
            let inner = self.lock();
            let listeners: Vec<Listener> = inner
                .listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            let records: Vec<FavoriteRecord> = inner.records.values().cloned().collect();
            (records, listeners)
        };

        for listener in listeners {
            listener(&records);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FavoritesInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Listener registration handle; dropping it unsubscribes.
pub struct FavoritesSubscription {
    inner: std::sync::Weak<Mutex<FavoritesInner>>,
    id: u64,
}

impl FavoritesSubscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for FavoritesSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

fn storage_key(owner: &OwnerId) -> String {
    format!("favorites:{owner}")
}

/// Write the snapshot for the current set.
///
/// Failure is logged and returned; the in-memory set is left as-is
/// (the session stays usable, storage catches up on the next
/// successful write).
fn persist(inner: &mut FavoritesInner) -> Result<(), crate::error::PersistenceError> {
    let records: Vec<&FavoriteRecord> = inner.records.values().collect();
    let snapshot = serde_json::to_string(&records)?;
    let key = storage_key(&inner.owner);

    inner.kv.set(&key, &snapshot).inspect_err(|error| {
        warn!(owner = %inner.owner, %error, "favorites persistence failed, in-memory set kept");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::error::PersistenceError;
    use crate::storage::MemoryKv;

    /// `KvStore` that hands the test a view of what was written.
    #[derive(Clone, Default)]
    struct SharedKv {
        entries: Arc<Mutex<MemoryKv>>,
    }

    impl SharedKv {
        fn seed(&self, key: &str, value: &str) {
            self.entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .set(key, value)
                .expect("memory set never fails");
        }

        fn get(&self, key: &str) -> Option<String> {
            self.entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
        }
    }

    impl KvStore for SharedKv {
        fn get(&self, key: &str) -> Option<String> {
            SharedKv::get(self, key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
            self.entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .set(key, value)
        }
    }

    /// `KvStore` whose writes always fail.
    struct FailingKv;

    impl KvStore for FailingKv {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::Write {
                key: key.to_owned(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn rose() -> RawProduct {
        serde_json::from_value(json!({
            "id": "p1",
            "name": "Rose bouquet",
            "price": 23
        }))
        .expect("raw product deserializes")
    }

    #[test]
    fn test_toggle_involution() {
        let store = FavoritesStore::load(Box::new(MemoryKv::new()), OwnerId::guest());

        let on = store.toggle(&rose()).expect("product has id");
        assert!(on.is_favorite && on.changed && on.persisted);
        assert!(store.is_favorite("p1"));
        assert_eq!(store.list().len(), 1);

        let off = store.toggle(&rose()).expect("product has id");
        assert!(!off.is_favorite && off.changed);
        assert!(!store.is_favorite("p1"));
        assert_eq!(store.list().len(), 0);
    }

    #[test]
    fn test_toggle_without_id_is_rejected() {
        let store = FavoritesStore::load(Box::new(MemoryKv::new()), OwnerId::guest());
        let nameless: RawProduct =
            serde_json::from_value(json!({"name": "Mystery"})).expect("deserializes");
        assert_eq!(store.toggle(&nameless), None);
        assert_eq!(store.list().len(), 0);
    }

    #[test]
    fn test_add_is_deduplicating() {
        let store = FavoritesStore::load(Box::new(MemoryKv::new()), OwnerId::guest());

        let first = store.add(&rose()).expect("product has id");
        assert!(first.changed);

        let second = store.add(&rose()).expect("product has id");
        assert!(!second.changed);
        assert!(second.is_favorite);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let store = FavoritesStore::load(Box::new(MemoryKv::new()), OwnerId::guest());
        let outcome = store.remove("nope");
        assert!(!outcome.changed);
        assert!(!outcome.is_favorite);
    }

    #[test]
    fn test_snapshot_written_and_cleared() {
        let kv = SharedKv::default();
        let store = FavoritesStore::load(Box::new(kv.clone()), OwnerId::guest());

        store.toggle(&rose()).expect("toggles on");
        let snapshot = kv.get("favorites:guest").expect("snapshot written");
        let parsed: Vec<FavoriteRecord> =
            serde_json::from_str(&snapshot).expect("snapshot is valid records");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.first().map(|r| r.id.as_str()), Some("p1"));

        store.toggle(&rose()).expect("toggles off");
        assert_eq!(kv.get("favorites:guest").as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_snapshot_recovers_and_heals() {
        let kv = SharedKv::default();
        kv.seed("favorites:guest", r#"{"not": "an array"}"#);

        let store = FavoritesStore::load(Box::new(kv.clone()), OwnerId::guest());
        assert_eq!(store.list().len(), 0);
        // corrupt value overwritten with a valid empty snapshot
        assert_eq!(kv.get("favorites:guest").as_deref(), Some("[]"));
    }

    #[test]
    fn test_unparseable_snapshot_recovers() {
        let kv = SharedKv::default();
        kv.seed("favorites:guest", "definitely not json");

        let store = FavoritesStore::load(Box::new(kv.clone()), OwnerId::guest());
        assert_eq!(store.list().len(), 0);
        assert_eq!(kv.get("favorites:guest").as_deref(), Some("[]"));
    }

    #[test]
    fn test_snapshot_with_bad_entries_keeps_good_ones() {
        let kv = SharedKv::default();
        let good = json!({
            "id": "p1",
            "name": "Rose bouquet",
            "description": "",
            "category": "",
            "price": 23.0,
            "image": "",
            "addedAt": "2026-08-30T12:00:00Z",
            "ownerId": "guest"
        });
        kv.seed(
            "favorites:guest",
            &json!([good, {"garbage": true}]).to_string(),
        );

        let store = FavoritesStore::load(Box::new(kv.clone()), OwnerId::guest());
        assert_eq!(store.list().len(), 1);
        assert!(store.is_favorite("p1"));

        // healed snapshot drops the bad entry
        let healed: Vec<FavoriteRecord> =
            serde_json::from_str(&kv.get("favorites:guest").expect("healed snapshot"))
                .expect("healed snapshot parses");
        assert_eq!(healed.len(), 1);
    }

    #[test]
    fn test_persistence_failure_keeps_memory_authoritative() {
        let store = FavoritesStore::load(Box::new(FailingKv), OwnerId::guest());

        let outcome = store.toggle(&rose()).expect("toggles");
        assert!(outcome.is_favorite);
        assert!(!outcome.persisted);
        // in-memory set unaffected by the failed write
        assert!(store.is_favorite("p1"));

        let off = store.toggle(&rose()).expect("toggles");
        assert!(!off.is_favorite);
        assert!(!store.is_favorite("p1"));
    }

    #[test]
    fn test_owner_scopes_storage_key() {
        let kv = SharedKv::default();

        let guest = FavoritesStore::load(Box::new(kv.clone()), OwnerId::guest());
        guest.toggle(&rose()).expect("toggles");

        let user = FavoritesStore::load(Box::new(kv.clone()), OwnerId::new("u-1"));
        assert!(!user.is_favorite("p1"), "owner snapshots are independent");
        assert!(kv.get("favorites:guest").is_some());
        assert_eq!(kv.get("favorites:u-1"), None);
    }

    #[test]
    fn test_subscribe_sees_membership_changes() {
        let store = FavoritesStore::load(Box::new(MemoryKv::new()), OwnerId::guest());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = store.subscribe(move |records| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(records.len());
        });

        store.toggle(&rose()).expect("on");
        store.toggle(&rose()).expect("off");
        subscription.unsubscribe();
        store.toggle(&rose()).expect("on again, unobserved");

        let seen = seen.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(seen, vec![1, 0]);
    }
}
