// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

pub mod config;
mod snapshot;
mod tracked;
mod update;

// Re-export all public types
pub use config::Settings;
pub use snapshot::{
    AvailabilityById, AvailabilityBySite, AvailabilityRecord, AvailabilityScan, LowestPrices,
    PriceOffer, PriceScanResult, SiteScan,
};
pub use tracked::{
    PAGE_NUMBER_PLACEHOLDER, TrackedItem, TrackedItems, TrackedSite, TrackedSites,
    parse_tracked_items, parse_tracked_sites,
};
pub use update::{AvailabilityUpdates, PriceUpdate};
