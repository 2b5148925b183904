//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_string_id!` macro to create type-safe ID wrappers
//! that prevent accidentally mixing IDs from different entity types.
//! Product and owner identifiers are opaque strings handed out by the
//! backend, so the wrappers are string-backed.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use bloomcart_core::define_string_id;
/// define_string_id!(ProductId);
/// define_string_id!(OwnerId);
///
/// let product_id = ProductId::new("p-1");
/// let owner_id = OwnerId::new("u-1");
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = owner_id;
/// ```
#[macro_export]
macro_rules! define_string_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_string_id!(ProductId);
define_string_id!(OwnerId);

impl OwnerId {
    /// Reserved owner key for anonymous sessions.
    ///
    /// Favorites toggled before sign-in persist under this key and are
    /// picked up again on the next anonymous visit.
    #[must_use]
    pub fn guest() -> Self {
        Self::new("guest")
    }
}
