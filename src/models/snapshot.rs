//! Scan results and persisted snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One offer found on a price comparison page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceOffer {
    pub shop: String,
    pub price: f64,
}

/// Raw price scan: every offer seen per item in one cycle.
pub type PriceScanResult = BTreeMap<String, Vec<PriceOffer>>;

/// Price snapshot: lowest known price per item.
pub type LowestPrices = BTreeMap<String, f64>;

/// Stock state of one listed item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityRecord {
    pub name: String,
    pub url: String,
    pub available: bool,
}

/// Items of one site keyed by item id.
pub type AvailabilityById = BTreeMap<String, AvailabilityRecord>;

/// Availability snapshot keyed by site id.
pub type AvailabilityBySite = BTreeMap<String, AvailabilityById>;

/// Result of scanning one availability site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteScan {
    /// Items merged from every page that was fetched and parsed
    pub items: AvailabilityById,
    /// Number of pages fetched successfully
    pub pages: u64,
    /// False when any page failed, so the listing may be partial
    pub complete: bool,
}

/// Result of one availability scan cycle, keyed by site id.
pub type AvailabilityScan = BTreeMap<String, SiteScan>;

impl SiteScan {
    /// Whether missing items can be read as gone from the listing.
    pub fn is_authoritative(&self) -> bool {
        self.complete && self.pages > 0
    }
}
