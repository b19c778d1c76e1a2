//! Scrape, reconcile and notify.
//!
//! - `scan`: paced fetching of tracked items and paginated sites
//! - `diff`: snapshot comparison for both domains
//! - `prices` / `availability`: one full cycle per domain
//! - `scheduler`: timers, on-demand requests and cross-cycle exclusion

pub mod availability;
pub mod diff;
pub mod prices;
pub mod scan;
pub mod scheduler;

use std::sync::Arc;

use crate::error::Result;
use crate::notify::Notifier;
use crate::parsers::ParserRegistry;
use crate::storage::{SnapshotStore, TrackedStore};
use crate::utils::http::{Fetcher, RequestPacer};

pub use availability::{AvailabilityCycleReport, run_availability_cycle};
pub use diff::{DiffCalculator, calculate_diff};
pub use prices::{PriceCycleReport, run_price_cycle};
pub use scan::Scanner;
pub use scheduler::{CycleGate, CycleKind, ScanRequests, Scheduler};

/// Everything a cycle needs, shared by all cycles of the process.
pub struct Watcher {
    fetcher: Arc<dyn Fetcher>,
    registry: Arc<ParserRegistry>,
    pacer: RequestPacer,
    snapshots: Arc<dyn SnapshotStore>,
    tracked: Arc<TrackedStore>,
    notifier: Notifier,
}

impl Watcher {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        registry: Arc<ParserRegistry>,
        pacer: RequestPacer,
        snapshots: Arc<dyn SnapshotStore>,
        tracked: Arc<TrackedStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            fetcher,
            registry,
            pacer,
            snapshots,
            tracked,
            notifier,
        }
    }

    fn scanner(&self) -> Scanner<'_> {
        Scanner::new(self.fetcher.as_ref(), &self.registry, &self.pacer)
    }

    /// Scan tracked price items and report price changes.
    pub async fn run_price_cycle(&self) -> Result<PriceCycleReport> {
        let items = self.tracked.items().await;
        Ok(run_price_cycle(&self.scanner(), &items, self.snapshots.as_ref(), &self.notifier).await)
    }

    /// Reload tracked sites, scan them and report availability changes.
    ///
    /// Fails without scanning when the sites file is invalid.
    pub async fn run_availability_cycle(&self) -> Result<AvailabilityCycleReport> {
        let sites = self.tracked.load_sites().await?;
        Ok(
            run_availability_cycle(&self.scanner(), &sites, self.snapshots.as_ref(), &self.notifier)
                .await,
        )
    }
}
