//! Resource keys identifying what a catalog fetch targets.

use serde::{Deserialize, Serialize};

/// Opaque identifier of what a fetch targets.
///
/// Equality is by value: two keys derived from different navigation
/// events compare equal iff they name the same catalog slice, which is
/// what the coordinator's idempotent re-entry guard relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKey {
    /// The full catalog (the "all" sentinel in the category picker).
    AllProducts,
    /// A single category by its slug.
    Category(String),
}

impl ResourceKey {
    /// Build a key from an optional category slug.
    ///
    /// `None`, the empty string, and the literal `"all"` all map to
    /// [`ResourceKey::AllProducts`].
    #[must_use]
    pub fn from_category(category: Option<&str>) -> Self {
        match category {
            None | Some("" | "all") => Self::AllProducts,
            Some(slug) => Self::Category(slug.to_owned()),
        }
    }

    /// The category slug, or `None` for the full catalog.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::AllProducts => None,
            Self::Category(slug) => Some(slug),
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllProducts => write!(f, "all"),
            Self::Category(slug) => write!(f, "{slug}"),
        }
    }
}
