//! Availability cycle: scan every site, diff per site, notify, persist.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{AvailabilityById, AvailabilityBySite, AvailabilityUpdates, TrackedSites};
use crate::notify::{Notifier, availability_messages};
use crate::pipeline::diff::{DiffCalculator, merge_availability};
use crate::pipeline::scan::Scanner;
use crate::storage::SnapshotStore;
use crate::utils::plural_items;

/// Outcome of one availability cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityCycleReport {
    /// Sites with at least one page fetched
    pub scanned_sites: usize,
    /// Transitions of sites that changed
    pub updates: BTreeMap<String, AvailabilityUpdates>,
    /// Snapshot after this cycle
    pub snapshot: AvailabilityBySite,
    pub messages_sent: usize,
}

/// Run one availability cycle over `sites`.
///
/// Only a completely walked listing can report items as gone by their
/// absence. Sites whose first page failed are left out of the diff and
/// keep their previous records.
pub async fn run_availability_cycle(
    scanner: &Scanner<'_>,
    sites: &TrackedSites,
    snapshots: &dyn SnapshotStore,
    notifier: &Notifier,
) -> AvailabilityCycleReport {
    let scan = scanner.scan_availability(sites).await;

    let raw: AvailabilityBySite = scan
        .iter()
        .map(|(id, site)| (id.clone(), site.items.clone()))
        .collect();
    match snapshots.archive_availability_scan(&raw).await {
        Ok(location) => log::info!("Availability scan archived to {location}"),
        Err(e) => log::error!("Failed to archive availability scan: {e}"),
    }

    let tracked: BTreeSet<String> = sites.keys().cloned().collect();
    let previous = snapshots
        .load_availability(&tracked)
        .await
        .unwrap_or_else(|e| {
            log::warn!("Could not load last availability, starting empty: {e}");
            AvailabilityBySite::new()
        });

    let empty = AvailabilityById::new();
    let mut report = AvailabilityCycleReport::default();

    for (site_id, site) in sites {
        let Some(site_scan) = scan.get(site_id).filter(|s| s.pages > 0) else {
            log::warn!("{site_id}: not scanned, keeping previous availability");
            continue;
        };
        report.scanned_sites += 1;

        let calculator = if site_scan.is_authoritative() {
            DiffCalculator::new()
        } else {
            DiffCalculator::listed_only()
        };
        let before = previous.get(site_id).unwrap_or(&empty);
        let updates = calculator.calculate(before, &site_scan.items);

        if updates.is_empty() {
            log::info!("{}: nothing changed", site.name);
            continue;
        }
        log_availability_updates(&site.name, &updates);

        // Vanished items are only named in the previous records.
        let mut info = before.clone();
        info.extend(site_scan.items.iter().map(|(k, v)| (k.clone(), v.clone())));

        let messages = availability_messages(&site.name, &info, &updates, notifier.char_limit());
        report.messages_sent += notifier.send(&messages).await;
        report.updates.insert(site_id.clone(), updates);
    }

    report.snapshot = merge_availability(&previous, &scan);
    if let Err(e) = snapshots.save_availability(&report.snapshot).await {
        log::error!("Failed to save last availability: {e}");
    }

    report
}

fn log_availability_updates(site_name: &str, updates: &AvailabilityUpdates) {
    let count = updates.len();
    log::info!(
        "{site_name} - Availability changed for {count} {}",
        plural_items(count)
    );
    for id in &updates.became_available {
        log::info!("Available: {id}");
    }
    for id in &updates.became_unavailable {
        log::info!("Not available: {id}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::models::TrackedSite;
    use crate::notify::tests::RecordingTransport;
    use crate::pipeline::scan::tests::{FakeFetcher, test_registry};
    use crate::storage::LocalStorage;
    use crate::utils::http::RequestPacer;

    fn sites(entries: &[(&str, &str)]) -> TrackedSites {
        entries
            .iter()
            .map(|(id, pattern)| {
                (
                    id.to_string(),
                    TrackedSite {
                        name: format!("Site {id}"),
                        url_pattern: pattern.to_string(),
                        initial_value: "1".into(),
                        parser: "csv".into(),
                    },
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_failed_site_keeps_previous_records_and_is_silent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let registry = test_registry();
        let pacer = RequestPacer::new(Duration::ZERO);
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), "42", Duration::ZERO, 4096);
        let sites = sites(&[("down", "https://down.test/{{PAGE_NUMBER}}")]);

        // Seed a snapshot through a working cycle.
        let up = FakeFetcher::with_pages(&[("https://down.test/1", "item1")]);
        let scanner = Scanner::new(&up, &registry, &pacer);
        run_availability_cycle(&scanner, &sites, &storage, &notifier).await;

        let down = FakeFetcher::default();
        let scanner = Scanner::new(&down, &registry, &pacer);
        let report = run_availability_cycle(&scanner, &sites, &storage, &notifier).await;

        assert_eq!(report.scanned_sites, 0);
        assert!(report.updates.is_empty());
        assert!(report.snapshot["down"].contains_key("item1"));
        assert_eq!(transport.texts().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_listing_does_not_infer_disappearance() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let registry = test_registry();
        let pacer = RequestPacer::new(Duration::ZERO);
        let notifier = Notifier::new(Arc::new(RecordingTransport::default()), "42", Duration::ZERO, 4096);
        let sites = sites(&[("shop", "https://s.test/{{PAGE_NUMBER}}")]);

        let full = FakeFetcher::with_pages(&[("https://s.test/1", "a|next"), ("https://s.test/2", "b")]);
        let scanner = Scanner::new(&full, &registry, &pacer);
        let report = run_availability_cycle(&scanner, &sites, &storage, &notifier).await;
        assert_eq!(report.updates["shop"].became_available, vec!["a", "b"]);

        // Second page fails: "b" is not reported gone.
        let partial = FakeFetcher::with_pages(&[("https://s.test/1", "a|next")]);
        let scanner = Scanner::new(&partial, &registry, &pacer);
        let report = run_availability_cycle(&scanner, &sites, &storage, &notifier).await;
        assert!(report.updates.is_empty());
        assert!(report.snapshot["shop"].contains_key("b"));
    }

    #[tokio::test]
    async fn test_unchanged_site_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let registry = test_registry();
        let pacer = RequestPacer::new(Duration::ZERO);
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), "42", Duration::ZERO, 4096);
        let sites = sites(&[
            ("one", "https://one.test/{{PAGE_NUMBER}}"),
            ("two", "https://two.test/{{PAGE_NUMBER}}"),
        ]);

        let fetcher = FakeFetcher::with_pages(&[
            ("https://one.test/1", "!x"),
            ("https://two.test/1", "y"),
        ]);
        let scanner = Scanner::new(&fetcher, &registry, &pacer);
        let report = run_availability_cycle(&scanner, &sites, &storage, &notifier).await;

        assert_eq!(report.scanned_sites, 2);
        assert_eq!(report.updates.keys().collect::<Vec<_>>(), vec!["two"]);
        assert_eq!(transport.texts().len(), 1);
        assert!(transport.texts()[0].starts_with("Site two \\- Availability changed for 1 item:"));
    }
}
