//! Decimal-backed price representation.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

/// A product price.
///
/// Backed by [`Decimal`] so arithmetic and comparisons stay exact in
/// memory. The backend emits prices as JSON numbers, so the serde
/// representation is a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero price, used when a raw product carries no usable amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Coerce a loosely-typed JSON price value.
    ///
    /// Accepts numbers and numeric strings (both shapes appear in the
    /// wild); anything else resolves to `None`.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => {
                n.as_f64().and_then(Decimal::from_f64).map(Self)
            }
            serde_json::Value::String(s) => s.trim().parse::<Decimal>().ok().map(Self),
            _ => None,
        }
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}
