//! Site parsers and the registry that names them.
//!
//! Parsers are pure functions over fetched content. Single entries that do
//! not match the expected shape are dropped; a page whose overall shape is
//! wrong is an error, so callers can tell it apart from an empty page.

mod justjoinit;
mod perfumehub;
mod perfumypl;

use std::collections::BTreeMap;

use scraper::Selector;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{AvailabilityById, PriceOffer};

/// Body of a fetched page.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    Text(String),
    Json(Value),
}

impl RawContent {
    /// Body as text. JSON bodies are re-serialized.
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => value.to_string(),
        }
    }

    /// Body as JSON, parsing text bodies when possible.
    pub fn json(&self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value.clone()),
            Self::Text(text) => serde_json::from_str(text).ok(),
        }
    }
}

/// Items found on one listing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityPage {
    pub items: AvailabilityById,
    pub has_next_page: bool,
}

pub type PriceParseFn = fn(&RawContent) -> Result<Vec<PriceOffer>>;
pub type AvailabilityParseFn = fn(&RawContent, &str) -> Result<AvailabilityPage>;

/// Extracts offers from a price comparison page.
#[derive(Debug, Clone, Copy)]
pub enum PriceParser {
    Perfumehub,
    Custom(PriceParseFn),
}

impl PriceParser {
    pub fn parse(&self, content: &RawContent) -> Result<Vec<PriceOffer>> {
        match self {
            Self::Perfumehub => perfumehub::parse(content),
            Self::Custom(parse) => parse(content),
        }
    }
}

/// Extracts item availability from one listing page.
#[derive(Debug, Clone, Copy)]
pub enum AvailabilityParser {
    Perfumypl,
    JustJoinIt,
    Custom(AvailabilityParseFn),
}

impl AvailabilityParser {
    /// `host` is the origin of the fetched page, used to absolutize links.
    pub fn parse(&self, content: &RawContent, host: &str) -> Result<AvailabilityPage> {
        match self {
            Self::Perfumypl => perfumypl::parse(content, host),
            Self::JustJoinIt => justjoinit::parse(content, host),
            Self::Custom(parse) => parse(content, host),
        }
    }
}

/// Name to parser lookup.
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry {
    price: BTreeMap<String, PriceParser>,
    availability: BTreeMap<String, AvailabilityParser>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in parser.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_price("perfumehub", PriceParser::Perfumehub);
        registry.register_availability("perfumypl", AvailabilityParser::Perfumypl);
        registry.register_availability("justjoinit", AvailabilityParser::JustJoinIt);
        registry
    }

    pub fn register_price(&mut self, name: impl Into<String>, parser: PriceParser) {
        self.price.insert(name.into(), parser);
    }

    pub fn register_availability(&mut self, name: impl Into<String>, parser: AvailabilityParser) {
        self.availability.insert(name.into(), parser);
    }

    /// Look up a price parser. Unknown names are configuration errors.
    pub fn price_parser(&self, name: &str) -> Result<PriceParser> {
        self.price
            .get(name)
            .copied()
            .ok_or_else(|| AppError::config(format!("Unknown parser: {name}.")))
    }

    /// Look up an availability parser. Unknown names are configuration errors.
    pub fn availability_parser(&self, name: &str) -> Result<AvailabilityParser> {
        self.availability
            .get(name)
            .copied()
            .ok_or_else(|| AppError::config(format!("Unknown parser: {name}.")))
    }

    /// Names of the registered price parsers.
    pub fn price_parser_names(&self) -> Vec<&str> {
        self.price.keys().map(String::as_str).collect()
    }
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_offer(_: &RawContent) -> Result<Vec<PriceOffer>> {
        Ok(vec![PriceOffer {
            shop: "A".into(),
            price: 1.0,
        }])
    }

    #[test]
    fn test_builtin_lookup() {
        let registry = ParserRegistry::builtin();
        assert!(registry.price_parser("perfumehub").is_ok());
        assert!(registry.availability_parser("perfumypl").is_ok());
        assert!(registry.availability_parser("justjoinit").is_ok());
        assert!(registry.price_parser("perfumypl").is_err());
    }

    #[test]
    fn test_unknown_name_is_config_error() {
        let err = ParserRegistry::builtin().availability_parser("missing").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_custom_parser() {
        let mut registry = ParserRegistry::new();
        registry.register_price("fixed", PriceParser::Custom(single_offer));
        let offers = registry
            .price_parser("fixed")
            .unwrap()
            .parse(&RawContent::Text(String::new()))
            .unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(registry.price_parser_names(), vec!["fixed"]);
    }

    #[test]
    fn test_text_body_parses_as_json() {
        let content = RawContent::Text("[1, 2]".into());
        assert_eq!(content.json(), Some(serde_json::json!([1, 2])));
        assert_eq!(RawContent::Text("<html>".into()).json(), None);
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("div.offer").is_ok());
        assert!(parse_selector("[[invalid").is_err());
    }
}
