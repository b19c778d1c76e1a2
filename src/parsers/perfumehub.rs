//! perfumehub.pl price comparison pages.

use regex::Regex;
use scraper::Html;

use super::{RawContent, parse_selector};
use crate::error::{AppError, Result};
use crate::models::PriceOffer;

const OFFER_SELECTOR: &str = "#main-content .offer";
const SHOP_SELECTOR: &str = ".shop-name > a";
const PRICE_SELECTOR: &str = ".price > a";
const PRICE_PATTERN: &str = r"[0-9]+\.[0-9]{2}";

pub(super) fn parse(content: &RawContent) -> Result<Vec<PriceOffer>> {
    let document = Html::parse_document(&content.text());
    let offer_sel = parse_selector(OFFER_SELECTOR)?;
    let shop_sel = parse_selector(SHOP_SELECTOR)?;
    let price_sel = parse_selector(PRICE_SELECTOR)?;
    let price_re = Regex::new(PRICE_PATTERN)
        .map_err(|e| AppError::config(format!("Invalid price pattern: {e}")))?;

    let offers = document
        .select(&offer_sel)
        .filter_map(|offer| {
            let shop: String = offer.select(&shop_sel).next()?.text().collect();
            let price_text: String = offer.select(&price_sel).next()?.text().collect();

            let shop = shop.trim();
            if shop.is_empty() {
                return None;
            }

            let price = price_re.find(&price_text)?.as_str().parse().ok()?;
            Some(PriceOffer {
                shop: shop.to_string(),
                price,
            })
        })
        .collect();

    Ok(offers)
}
