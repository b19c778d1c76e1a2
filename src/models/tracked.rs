//! Tracked price items and availability sites.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::parsers::ParserRegistry;

/// Placeholder replaced by the page number in an availability URL pattern.
pub const PAGE_NUMBER_PLACEHOLDER: &str = "{{PAGE_NUMBER}}";

/// Tracked price items keyed by id.
pub type TrackedItems = BTreeMap<String, TrackedItem>;

/// Tracked availability sites keyed by id.
pub type TrackedSites = BTreeMap<String, TrackedSite>;

/// A product whose lowest offer price is watched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedItem {
    /// Display name
    pub name: String,

    /// Product comparison page
    pub url: String,

    /// Price parser name
    pub parser: String,
}

/// A paginated listing whose items are watched for availability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedSite {
    /// Display name
    pub name: String,

    /// Listing URL, possibly containing [`PAGE_NUMBER_PLACEHOLDER`]
    pub url_pattern: String,

    /// First page value, as written in the configuration file
    pub initial_value: String,

    /// Availability parser name
    pub parser: String,
}

impl TrackedSite {
    /// First page number. Non-numeric initial values start at 0.
    pub fn first_page(&self) -> u64 {
        self.initial_value.trim().parse().unwrap_or(0)
    }

    /// URL of the given page.
    pub fn page_url(&self, page: u64) -> String {
        self.url_pattern
            .replace(PAGE_NUMBER_PLACEHOLDER, &page.to_string())
    }
}

/// Entry as found in a tracked-items file, before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    url_pattern: Option<String>,
    #[serde(default)]
    initial_value: Option<Value>,
    #[serde(default)]
    parser: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn initial_value_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse and validate a tracked price items document.
///
/// Any malformed entry or unknown parser fails the whole load.
pub fn parse_tracked_items(json: &str, registry: &ParserRegistry) -> Result<TrackedItems> {
    let raw: BTreeMap<String, RawEntry> = serde_json::from_str(json)?;
    let mut items = TrackedItems::new();

    for (id, entry) in raw {
        let (Some(name), Some(url), Some(parser)) = (
            non_empty(entry.name),
            non_empty(entry.url),
            non_empty(entry.parser),
        ) else {
            return Err(AppError::config(format!(
                "Wrong definition of {id} tracked price item."
            )));
        };

        registry.price_parser(&parser)?;
        items.insert(id, TrackedItem { name, url, parser });
    }

    Ok(items)
}

/// Parse and validate a tracked availability sites document.
pub fn parse_tracked_sites(json: &str, registry: &ParserRegistry) -> Result<TrackedSites> {
    let raw: BTreeMap<String, RawEntry> = serde_json::from_str(json)?;
    let mut sites = TrackedSites::new();

    for (id, entry) in raw {
        let (Some(name), Some(url_pattern), Some(initial_value), Some(parser)) = (
            non_empty(entry.name),
            non_empty(entry.url_pattern),
            initial_value_text(entry.initial_value),
            non_empty(entry.parser),
        ) else {
            return Err(AppError::config(format!(
                "Wrong definition of {id} tracked availability site."
            )));
        };

        registry.availability_parser(&parser)?;
        sites.insert(
            id,
            TrackedSite {
                name,
                url_pattern,
                initial_value,
                parser,
            },
        );
    }

    Ok(sites)
}
