//! UI toggle gestures mapped into favorites mutations.

use tracing::{debug, warn};

use bloomcart_core::RawProduct;

use crate::favorites::{FavoritesStore, MutationOutcome};

/// Maps a toggle gesture's payload onto the favorites store.
///
/// The payload is whatever the UI had at hand for the product - any of
/// the raw catalog shapes - so it arrives as loose JSON and the store's
/// normalization decides whether it is usable.
#[derive(Clone)]
pub struct ToggleReducer {
    store: FavoritesStore,
}

impl ToggleReducer {
    #[must_use]
    pub fn new(store: FavoritesStore) -> Self {
        Self { store }
    }

    /// Apply a toggle for the given product payload.
    ///
    /// Returns `None` (and logs) when the payload does not describe a
    /// product with a usable id; never panics on malformed input.
    pub fn apply(&self, payload: &serde_json::Value) -> Option<MutationOutcome> {
        let product: RawProduct = match serde_json::from_value(payload.clone()) {
            Ok(product) => product,
            Err(error) => {
                warn!(%error, "toggle payload is not a product shape");
                return None;
            }
        };

        let outcome = self.store.toggle(&product);
        match &outcome {
            Some(outcome) => debug!(
                is_favorite = outcome.is_favorite,
                persisted = outcome.persisted,
                "favorite toggled"
            ),
            None => warn!("toggle payload has no usable product id"),
        }
        outcome
    }
}
