//! Raw product wire shape and the normalized favorite record.
//!
//! The catalog endpoints and the legacy favorites snapshot disagree on
//! field shapes: ids arrive as `id` or `_id` (string or number), the
//! primary image as `image` or `images[0].image`, prices as numbers or
//! numeric strings. [`RawProduct`] absorbs all of those;
//! [`FavoriteRecord::normalize`] resolves them into one canonical
//! shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{OwnerId, ProductId};
use crate::types::price::Price;

/// One entry of a raw `images` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawImage {
    pub image: Option<String>,
    pub url: Option<String>,
}

/// A product as it arrives from the wire, before normalization.
///
/// Unknown fields are ignored; every known field is optional so any of
/// the shapes the backend (or the persisted snapshot) produces can be
/// deserialized without failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProduct {
    pub id: Option<serde_json::Value>,
    /// Legacy document id emitted by the original Mongo-backed API.
    #[serde(rename = "_id")]
    pub legacy_id: Option<serde_json::Value>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<serde_json::Value>,
    pub image: Option<String>,
    pub images: Option<Vec<RawImage>>,
    pub stock: Option<i64>,
    /// Present when re-normalizing an already-normalized record.
    #[serde(rename = "addedAt")]
    pub added_at: Option<DateTime<Utc>>,
    /// Present when re-normalizing an already-normalized record.
    #[serde(rename = "ownerId")]
    pub owner_id: Option<OwnerId>,
}

impl RawProduct {
    /// Resolve the stable product identifier.
    ///
    /// Prefers `id` over `_id`; accepts strings and numbers. Returns
    /// `None` when neither field carries a usable value.
    #[must_use]
    pub fn resolve_id(&self) -> Option<ProductId> {
        [self.id.as_ref(), self.legacy_id.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|value| match value {
                serde_json::Value::String(s) if !s.trim().is_empty() => {
                    Some(ProductId::new(s.trim()))
                }
                serde_json::Value::Number(n) => Some(ProductId::new(n.to_string())),
                _ => None,
            })
    }

    /// Resolve the primary image URL.
    ///
    /// Prefers the flat `image` field, then the first entry of the
    /// `images` array (`image` or `url` key).
    #[must_use]
    pub fn resolve_image(&self) -> Option<String> {
        if let Some(image) = &self.image
            && !image.is_empty()
        {
            return Some(image.clone());
        }

        self.images
            .as_ref()?
            .iter()
            .find_map(|entry| entry.image.clone().or_else(|| entry.url.clone()))
            .filter(|url| !url.is_empty())
    }
}

/// Normalized, persisted snapshot of a user-selected product.
///
/// Serialized camelCase: the snapshot format is shared with the web
/// client that originally wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Price,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    pub added_at: DateTime<Utc>,
    pub owner_id: OwnerId,
}

impl FavoriteRecord {
    /// Normalize a raw product into its canonical snapshot shape.
    ///
    /// Pure and idempotent: normalizing an already-normalized record
    /// changes nothing, because `addedAt` and `ownerId` are preserved
    /// when present. Returns `None` when no usable id can be resolved.
    #[must_use]
    pub fn normalize(raw: &RawProduct, owner: &OwnerId) -> Option<Self> {
        let id = raw.resolve_id()?;

        Some(Self {
            id,
            name: raw.name.clone().unwrap_or_default(),
            description: raw.description.clone().unwrap_or_default(),
            category: raw.category.clone().unwrap_or_default(),
            price: raw
                .price
                .as_ref()
                .and_then(Price::from_json)
                .unwrap_or(Price::ZERO),
            image: raw.resolve_image().unwrap_or_default(),
            stock: raw.stock,
            added_at: raw.added_at.unwrap_or_else(Utc::now),
            owner_id: raw.owner_id.clone().unwrap_or_else(|| owner.clone()),
        })
    }
}

impl From<&FavoriteRecord> for RawProduct {
    fn from(record: &FavoriteRecord) -> Self {
        Self {
            id: Some(serde_json::Value::String(record.id.as_str().to_owned())),
            legacy_id: None,
            name: Some(record.name.clone()),
            description: Some(record.description.clone()),
            category: Some(record.category.clone()),
            // String form keeps the decimal exact through re-normalization
            price: Some(serde_json::Value::String(record.price.amount().to_string())),
            image: Some(record.image.clone()),
            images: None,
            stock: record.stock,
            added_at: Some(record.added_at),
            owner_id: Some(record.owner_id.clone()),
        }
    }
}
