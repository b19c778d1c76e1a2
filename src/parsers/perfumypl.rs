//! perfumy.pl search listings.

use scraper::Html;
use url::Url;

use super::{AvailabilityPage, RawContent, parse_selector};
use crate::error::{AppError, Result};
use crate::models::AvailabilityRecord;
use crate::utils::resolve_url;

const LISTING_SELECTOR: &str = "#search";
const ITEM_SELECTOR: &str = "#search .product a.product__name";
const NEXT_SELECTOR: &str = r#".pagination__element[class~="--next"]"#;
const DISABLED_NEXT_SELECTOR: &str =
    r#".pagination__element[class~="--next"][class~="--disabled"]"#;

/// A page without the search listing (an error or challenge page) is a
/// parse error, not an empty result.
pub(super) fn parse(content: &RawContent, host: &str) -> Result<AvailabilityPage> {
    let document = Html::parse_document(&content.text());
    let listing_sel = parse_selector(LISTING_SELECTOR)?;
    if document.select(&listing_sel).next().is_none() {
        return Err(AppError::parse("perfumy.pl page has no search listing"));
    }

    let item_sel = parse_selector(ITEM_SELECTOR)?;
    let next_sel = parse_selector(NEXT_SELECTOR)?;
    let disabled_next_sel = parse_selector(DISABLED_NEXT_SELECTOR)?;
    let base = Url::parse(host)?;

    let mut page = AvailabilityPage {
        has_next_page: document.select(&next_sel).next().is_some()
            && document.select(&disabled_next_sel).next().is_none(),
        ..AvailabilityPage::default()
    };

    for link in document.select(&item_sel) {
        let raw_name: String = link.text().collect();
        let name = raw_name.trim();
        let Some(href) = link.value().attr("href").filter(|h| !h.is_empty()) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        let id: String = name
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();

        page.items.insert(
            id,
            AvailabilityRecord {
                name: name.to_string(),
                url: resolve_url(&base, href),
                available: true,
            },
        );
    }

    Ok(page)
}
