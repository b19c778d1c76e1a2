//! Diff calculation between the previous and current snapshots.
//!
//! The two domains are deliberately asymmetric. Prices never expire: an item
//! missing from a scan keeps its previous lowest price and produces no
//! update. Stock listings do expire: an item that was available and is gone
//! from a complete listing counts as no longer available.

use crate::models::{
    AvailabilityById, AvailabilityBySite, AvailabilityScan, AvailabilityUpdates, LowestPrices,
    PriceScanResult, PriceUpdate,
};

/// Reduce each item's offers to the minimum price.
///
/// Items without offers contribute nothing.
pub fn lowest_prices(scan: &PriceScanResult) -> LowestPrices {
    scan.iter()
        .filter_map(|(id, offers)| {
            offers
                .iter()
                .map(|o| o.price)
                .reduce(f64::min)
                .map(|min| (id.clone(), min))
        })
        .collect()
}

/// Previous snapshot overlaid with freshly scanned values.
pub fn merge_prices(previous: &LowestPrices, scanned: &LowestPrices) -> LowestPrices {
    let mut merged = previous.clone();
    merged.extend(scanned.iter().map(|(id, price)| (id.clone(), *price)));
    merged
}

/// Classify every id of the current snapshot.
///
/// Prices are compared by exact equality.
pub fn diff_prices(previous: &LowestPrices, current: &LowestPrices) -> Vec<PriceUpdate> {
    current
        .iter()
        .filter_map(|(id, &price)| match previous.get(id) {
            None => Some(PriceUpdate::New {
                id: id.clone(),
                price,
            }),
            Some(&previous_price) if previous_price != price => Some(PriceUpdate::Changed {
                id: id.clone(),
                previous_price,
                price,
            }),
            Some(_) => None,
        })
        .collect()
}

/// Calculator for availability transitions of one site.
#[derive(Debug, Clone)]
pub struct DiffCalculator {
    /// Whether ids missing from the current listing count as gone
    missing_is_unavailable: bool,
}

impl Default for DiffCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffCalculator {
    /// Calculator for a complete listing.
    pub fn new() -> Self {
        Self {
            missing_is_unavailable: true,
        }
    }

    /// Calculator for a partial listing: only listed ids are classified.
    pub fn listed_only() -> Self {
        Self {
            missing_is_unavailable: false,
        }
    }

    /// Calculate transitions between two listings of one site.
    pub fn calculate(
        &self,
        previous: &AvailabilityById,
        current: &AvailabilityById,
    ) -> AvailabilityUpdates {
        let mut updates = AvailabilityUpdates::default();

        for (id, record) in current {
            let was_available = previous.get(id).is_some_and(|r| r.available);
            if record.available && !was_available {
                updates.became_available.push(id.clone());
            } else if !record.available && was_available {
                updates.became_unavailable.push(id.clone());
            }
        }

        // Disjoint from the loop above: only ids absent from the current listing.
        if self.missing_is_unavailable {
            for (id, record) in previous {
                if record.available && !current.contains_key(id) {
                    updates.became_unavailable.push(id.clone());
                }
            }
        }

        updates
    }
}

/// Convenience function for a complete listing.
pub fn calculate_diff(previous: &AvailabilityById, current: &AvailabilityById) -> AvailabilityUpdates {
    DiffCalculator::new().calculate(previous, current)
}

/// Next availability snapshot.
///
/// Complete listings replace the site's previous records. Partial listings
/// are overlaid on them. Sites not scanned keep their previous records.
pub fn merge_availability(previous: &AvailabilityBySite, scan: &AvailabilityScan) -> AvailabilityBySite {
    let mut merged = previous.clone();

    for (site_id, site) in scan {
        if site.is_authoritative() {
            merged.insert(site_id.clone(), site.items.clone());
        } else if !site.items.is_empty() {
            merged
                .entry(site_id.clone())
                .or_default()
                .extend(site.items.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityRecord, PriceOffer, SiteScan};

    fn offer(shop: &str, price: f64) -> PriceOffer {
        PriceOffer {
            shop: shop.to_string(),
            price,
        }
    }

    fn prices(pairs: &[(&str, f64)]) -> LowestPrices {
        pairs.iter().map(|(id, p)| (id.to_string(), *p)).collect()
    }

    fn listing(pairs: &[(&str, bool)]) -> AvailabilityById {
        pairs
            .iter()
            .map(|(id, available)| {
                (
                    id.to_string(),
                    AvailabilityRecord {
                        name: id.to_string(),
                        url: format!("https://shop.test/{id}"),
                        available: *available,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_lowest_prices_skips_empty_offer_lists() {
        let scan: PriceScanResult = [
            ("a".to_string(), vec![offer("A", 120.0), offer("B", 99.99)]),
            ("b".to_string(), vec![]),
        ]
        .into_iter()
        .collect();

        assert_eq!(lowest_prices(&scan), prices(&[("a", 99.99)]));
    }

    #[test]
    fn test_price_change_detected() {
        let previous = prices(&[("X", 100.0)]);
        let scanned = lowest_prices(
            &[("X".to_string(), vec![offer("A", 90.0)])]
                .into_iter()
                .collect(),
        );
        let current = merge_prices(&previous, &scanned);

        assert_eq!(current, prices(&[("X", 90.0)]));
        assert_eq!(
            diff_prices(&previous, &current),
            vec![PriceUpdate::Changed {
                id: "X".into(),
                previous_price: 100.0,
                price: 90.0
            }]
        );
    }

    #[test]
    fn test_new_and_unchanged_prices() {
        let previous = prices(&[("a", 10.0), ("b", 20.0)]);
        let current = merge_prices(&previous, &prices(&[("b", 20.0), ("c", 5.0)]));

        assert_eq!(
            diff_prices(&previous, &current),
            vec![PriceUpdate::New {
                id: "c".into(),
                price: 5.0
            }]
        );
    }

    #[test]
    fn test_missing_price_is_carried_forward_silently() {
        let previous = prices(&[("a", 10.0)]);
        let current = merge_prices(&previous, &LowestPrices::new());

        assert_eq!(current, previous);
        assert!(diff_prices(&previous, &current).is_empty());
    }

    #[test]
    fn test_exact_float_comparison() {
        let previous = prices(&[("a", 0.1 + 0.2)]);
        let current = prices(&[("a", 0.3)]);
        assert_eq!(diff_prices(&previous, &current).len(), 1);
    }

    #[test]
    fn test_became_available() {
        let updates = calculate_diff(&listing(&[("a", false)]), &listing(&[("a", true), ("b", true)]));
        assert_eq!(updates.became_available, vec!["a", "b"]);
        assert!(updates.became_unavailable.is_empty());
    }

    #[test]
    fn test_became_unavailable_by_flag_and_disappearance() {
        let previous = listing(&[("a", true), ("b", true), ("c", false)]);
        let current = listing(&[("a", false)]);

        let updates = calculate_diff(&previous, &current);
        assert!(updates.became_available.is_empty());
        assert_eq!(updates.became_unavailable, vec!["a", "b"]);
    }

    #[test]
    fn test_unavailable_in_both_is_silent() {
        let updates = calculate_diff(&listing(&[("a", false)]), &listing(&[("a", false)]));
        assert!(updates.is_empty());
    }

    #[test]
    fn test_no_id_in_both_sets() {
        let previous = listing(&[("a", true), ("b", false), ("c", true)]);
        let current = listing(&[("a", false), ("b", true)]);

        let updates = calculate_diff(&previous, &current);
        for id in &updates.became_available {
            assert!(!updates.became_unavailable.contains(id));
        }
        assert_eq!(updates.len(), 3);
    }

    #[test]
    fn test_partial_listing_ignores_missing_ids() {
        let previous = listing(&[("a", true), ("b", true)]);
        let current = listing(&[("b", false)]);

        let updates = DiffCalculator::listed_only().calculate(&previous, &current);
        assert_eq!(updates.became_unavailable, vec!["b"]);
    }

    #[test]
    fn test_merge_availability() {
        let previous: AvailabilityBySite = [
            ("complete".to_string(), listing(&[("old", true)])),
            ("partial".to_string(), listing(&[("kept", true)])),
            ("failed".to_string(), listing(&[("x", true)])),
        ]
        .into_iter()
        .collect();

        let scan: AvailabilityScan = [
            (
                "complete".to_string(),
                SiteScan {
                    items: listing(&[("new", true)]),
                    pages: 1,
                    complete: true,
                },
            ),
            (
                "partial".to_string(),
                SiteScan {
                    items: listing(&[("seen", true)]),
                    pages: 1,
                    complete: false,
                },
            ),
            ("failed".to_string(), SiteScan::default()),
        ]
        .into_iter()
        .collect();

        let merged = merge_availability(&previous, &scan);
        assert_eq!(merged["complete"], listing(&[("new", true)]));
        assert_eq!(merged["partial"], listing(&[("kept", true), ("seen", true)]));
        assert_eq!(merged["failed"], listing(&[("x", true)]));
    }
}
