//! Classified changes between two snapshots.

use serde::{Deserialize, Serialize};

/// A change of an item's lowest price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PriceUpdate {
    /// First price ever seen for the item
    New { id: String, price: f64 },
    /// Lowest price moved
    #[serde(rename_all = "camelCase")]
    Changed {
        id: String,
        previous_price: f64,
        price: f64,
    },
}

impl PriceUpdate {
    /// Whether the lowest price went down.
    pub fn is_drop(&self) -> bool {
        matches!(self, Self::Changed { previous_price, price, .. } if price < previous_price)
    }
}

/// Availability transitions of one site.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityUpdates {
    pub became_available: Vec<String>,
    pub became_unavailable: Vec<String>,
}

impl AvailabilityUpdates {
    pub fn is_empty(&self) -> bool {
        self.became_available.is_empty() && self.became_unavailable.is_empty()
    }

    pub fn len(&self) -> usize {
        self.became_available.len() + self.became_unavailable.len()
    }
}
