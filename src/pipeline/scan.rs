// src/pipeline/scan.rs

//! Sequential, paced scanning of tracked items and sites.
//!
//! Entities are scanned one after another, never concurrently. A failure
//! for one entity or page is logged and skipped; it never aborts the cycle.

use crate::error::Result;
use crate::models::{AvailabilityScan, PriceScanResult, SiteScan, TrackedItems, TrackedSite, TrackedSites};
use crate::parsers::{ParserRegistry, RawContent};
use crate::utils::http::{Fetcher, RequestPacer};
use crate::utils::origin;

/// Upper bound on pages fetched for one site in one cycle.
pub const MAX_PAGES_PER_SITE: u64 = 1000;

/// Runs one scan pass over tracked entities.
pub struct Scanner<'a> {
    fetcher: &'a dyn Fetcher,
    registry: &'a ParserRegistry,
    pacer: &'a RequestPacer,
}

impl<'a> Scanner<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, registry: &'a ParserRegistry, pacer: &'a RequestPacer) -> Self {
        Self {
            fetcher,
            registry,
            pacer,
        }
    }

    /// Fetch every tracked item once and collect its offers.
    ///
    /// Items whose fetch or parse fails are absent from the result. Items
    /// whose page yielded no offers are present with an empty list.
    pub async fn scan_prices(&self, items: &TrackedItems) -> PriceScanResult {
        log::info!("Scraping {} items...", items.len());
        let mut result = PriceScanResult::new();

        for (id, item) in items {
            let parser = match self.registry.price_parser(&item.parser) {
                Ok(parser) => parser,
                Err(e) => {
                    log::error!("Skipping {id}: {e}");
                    continue;
                }
            };

            let content = match self.fetch(&item.url).await {
                Ok(content) => content,
                Err(e) => {
                    log::error!("Failed to scrape {id}: {e}");
                    continue;
                }
            };

            match parser.parse(&content) {
                Ok(offers) => {
                    log::debug!("{id}: {} offers", offers.len());
                    result.insert(id.clone(), offers);
                }
                Err(e) => log::error!("Failed to parse {id}: {e}"),
            }
        }

        log::info!(
            "Price scan complete: {}/{} items scraped",
            result.len(),
            items.len()
        );
        result
    }

    /// Walk every tracked site page by page.
    pub async fn scan_availability(&self, sites: &TrackedSites) -> AvailabilityScan {
        log::info!("Scraping {} sites...", sites.len());
        let mut result = AvailabilityScan::new();

        for (id, site) in sites {
            let scan = self.scan_site(id, site).await;
            log::info!(
                "{id}: {} items on {} pages{}",
                scan.items.len(),
                scan.pages,
                if scan.complete { "" } else { " (incomplete)" }
            );
            result.insert(id.clone(), scan);
        }

        log::info!("Availability scan complete");
        result
    }

    async fn scan_site(&self, id: &str, site: &TrackedSite) -> SiteScan {
        let mut scan = SiteScan::default();

        let parser = match self.registry.availability_parser(&site.parser) {
            Ok(parser) => parser,
            Err(e) => {
                log::error!("Skipping {id}: {e}");
                return scan;
            }
        };

        let mut page = site.first_page();
        loop {
            if scan.pages >= MAX_PAGES_PER_SITE {
                log::warn!("{id}: stopped after {MAX_PAGES_PER_SITE} pages");
                return scan;
            }

            let url = site.page_url(page);
            let content = match self.fetch(&url).await {
                Ok(content) => content,
                Err(e) => {
                    log::error!("Failed to scrape {id} page {page}: {e}");
                    return scan;
                }
            };

            let host = origin(&url).unwrap_or_default();
            let found = match parser.parse(&content, &host) {
                Ok(found) => found,
                Err(e) => {
                    log::error!("Failed to parse {id} page {page}: {e}");
                    return scan;
                }
            };
            scan.pages += 1;
            scan.items.extend(found.items);

            if !found.has_next_page {
                scan.complete = true;
                return scan;
            }
            page += 1;
        }
    }

    async fn fetch(&self, url: &str) -> Result<RawContent> {
        self.pacer.wait_turn().await;
        self.fetcher.fetch(url).await
    }
}
