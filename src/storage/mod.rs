//! Storage abstractions for snapshot persistence.
//!
//! ## Directory Structure
//!
//! ```text
//! {results}/
//! ├── lowest_prices.json                         # Latest price snapshot
//! ├── last_availability.json                     # Latest availability snapshot
//! ├── prices_YYYY_MM_DD__HH_MM_SS.json           # Raw price scan (immutable)
//! └── availability_YYYY_MM_DD__HH_MM_SS.json     # Raw availability scan (immutable)
//! ```
//!
//! Snapshot files carry a `LAST_UPDATE` field that is stripped on load.

pub mod local;
pub mod tracked;

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::{AvailabilityBySite, LowestPrices, PriceScanResult};

// Re-export for convenience
pub use local::LocalStorage;
pub use tracked::TrackedStore;

/// Reserved snapshot field holding the save time.
pub const LAST_UPDATE: &str = "LAST_UPDATE";

/// Trait for snapshot storage backends.
///
/// Loads drop keys that are no longer tracked. Saves persist exactly what
/// they are given.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the lowest price snapshot, keeping only tracked ids.
    async fn load_lowest_prices(&self, tracked: &BTreeSet<String>) -> Result<LowestPrices>;

    /// Persist the lowest price snapshot.
    async fn save_lowest_prices(&self, prices: &LowestPrices) -> Result<()>;

    /// Load the availability snapshot, keeping only tracked sites.
    async fn load_availability(&self, tracked: &BTreeSet<String>) -> Result<AvailabilityBySite>;

    /// Persist the availability snapshot.
    async fn save_availability(&self, snapshot: &AvailabilityBySite) -> Result<()>;

    /// Write an immutable archive of one price scan. Returns its location.
    async fn archive_price_scan(&self, scan: &PriceScanResult) -> Result<String>;

    /// Write an immutable archive of one availability scan. Returns its location.
    async fn archive_availability_scan(&self, scan: &AvailabilityBySite) -> Result<String>;
}

/// Write bytes atomically (write to temp, then rename).
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
