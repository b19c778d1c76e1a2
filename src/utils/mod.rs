//! Utility functions and helpers.

pub mod http;

use chrono::{DateTime, TimeZone};
use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Origin (`scheme://host[:port]`) of a URL string.
pub fn origin(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Human readable timestamp, e.g. `03:24:00 17/12/1995`.
pub fn format_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    datetime.format("%H:%M:%S %d/%m/%Y").to_string()
}

/// Sortable, file name friendly timestamp, e.g. `1995_12_17__03_24_00`.
pub fn file_timestamp<Tz: TimeZone>(datetime: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    datetime.format("%Y_%m_%d__%H_%M_%S").to_string()
}

/// `item` or `items` depending on the count.
pub fn plural_items(count: usize) -> &'static str {
    if count == 1 { "item" } else { "items" }
}
