//! Test doubles shared by the cycle tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pricewatch::error::{AppError, Result};
use pricewatch::models::{AvailabilityRecord, PriceOffer};
use pricewatch::notify::{Notifier, Transport};
use pricewatch::parsers::{
    AvailabilityPage, AvailabilityParser, ParserRegistry, PriceParser, RawContent,
};
use pricewatch::utils::http::Fetcher;

/// Serves bodies by URL. Bodies can be swapped between cycles.
#[derive(Default)]
pub struct StubFetcher {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn serve(&self, url: &str, body: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<RawContent> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .map(|body| RawContent::Text(body.clone()))
            .ok_or_else(|| AppError::fetch(url, "not served"))
    }
}

/// Records every sent message.
#[derive(Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_message(&self, _chat_id: &str, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// `shop=price;shop=price`
fn stub_prices(content: &RawContent) -> Result<Vec<PriceOffer>> {
    Ok(content
        .text()
        .split(';')
        .filter_map(|pair| {
            let (shop, price) = pair.split_once('=')?;
            Some(PriceOffer {
                shop: shop.to_string(),
                price: price.parse().ok()?,
            })
        })
        .collect())
}

/// `id;id;...`, each item available, single page.
fn stub_listing(content: &RawContent, host: &str) -> Result<AvailabilityPage> {
    let items = content
        .text()
        .split(';')
        .filter(|id| !id.is_empty())
        .map(|id| {
            (
                id.to_string(),
                AvailabilityRecord {
                    name: format!("Item {id}"),
                    url: format!("{host}/{id}"),
                    available: true,
                },
            )
        })
        .collect();
    Ok(AvailabilityPage {
        items,
        has_next_page: false,
    })
}

/// Built-in parsers plus the `stub` ones.
pub fn registry() -> ParserRegistry {
    let mut registry = ParserRegistry::builtin();
    registry.register_price("stub", PriceParser::Custom(stub_prices));
    registry.register_availability("stub", AvailabilityParser::Custom(stub_listing));
    registry
}

pub fn notifier(transport: Arc<MemoryTransport>) -> Notifier {
    Notifier::new(transport, "42", Duration::ZERO, 4096)
}
