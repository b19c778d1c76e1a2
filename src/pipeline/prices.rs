//! Price cycle: scan, archive, diff, notify, persist.

use std::collections::BTreeSet;

use crate::models::{LowestPrices, PriceUpdate, TrackedItems};
use crate::notify::{Notifier, price_messages};
use crate::pipeline::diff::{diff_prices, lowest_prices, merge_prices};
use crate::pipeline::scan::Scanner;
use crate::storage::SnapshotStore;
use crate::utils::plural_items;

/// Outcome of one price cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceCycleReport {
    /// Items whose page was fetched
    pub scanned: usize,
    pub updates: Vec<PriceUpdate>,
    /// Snapshot after this cycle
    pub lowest: LowestPrices,
    pub messages_sent: usize,
}

/// Run one price cycle over `items`.
///
/// Snapshot read failures fall back to an empty previous snapshot. Archive
/// and save failures are logged; the cycle still completes.
pub async fn run_price_cycle(
    scanner: &Scanner<'_>,
    items: &TrackedItems,
    snapshots: &dyn SnapshotStore,
    notifier: &Notifier,
) -> PriceCycleReport {
    let scan = scanner.scan_prices(items).await;

    match snapshots.archive_price_scan(&scan).await {
        Ok(location) => log::info!("Price scan archived to {location}"),
        Err(e) => log::error!("Failed to archive price scan: {e}"),
    }

    let tracked: BTreeSet<String> = items.keys().cloned().collect();
    let previous = snapshots
        .load_lowest_prices(&tracked)
        .await
        .unwrap_or_else(|e| {
            log::warn!("Could not load lowest prices, starting empty: {e}");
            LowestPrices::new()
        });

    let current = merge_prices(&previous, &lowest_prices(&scan));
    let updates = diff_prices(&previous, &current);

    let mut messages_sent = 0;
    if updates.is_empty() {
        log::info!("No price changes");
    } else {
        log_price_updates(&updates);
        let messages = price_messages(items, &updates, notifier.char_limit());
        messages_sent = notifier.send(&messages).await;
    }

    if let Err(e) = snapshots.save_lowest_prices(&current).await {
        log::error!("Failed to save lowest prices: {e}");
    }

    PriceCycleReport {
        scanned: scan.len(),
        updates,
        lowest: current,
        messages_sent,
    }
}

fn log_price_updates(updates: &[PriceUpdate]) {
    let count = updates.len();
    log::info!("Price changed for {count} {}", plural_items(count));

    for update in updates {
        match update {
            PriceUpdate::New { id, price } => log::info!(" + {price} ({id})"),
            PriceUpdate::Changed {
                id,
                previous_price,
                price,
            } if update.is_drop() => log::info!("{previous_price} -> {price} ({id})"),
            PriceUpdate::Changed {
                id,
                previous_price,
                price,
            } => log::info!("{price} <- {previous_price} ({id})"),
        }
    }
}
