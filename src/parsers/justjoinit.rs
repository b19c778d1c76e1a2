//! justjoin.it offers API (JSON).

use serde::Deserialize;
use serde_json::Value;

use super::{AvailabilityPage, RawContent};
use crate::error::{AppError, Result};
use crate::models::AvailabilityRecord;

const OFFER_URL_BASE: &str = "https://justjoin.it/offers/";

#[derive(Debug, Deserialize)]
struct Offer {
    id: String,
    title: String,
    #[serde(default)]
    experience_level: String,
    #[serde(default)]
    company_name: String,
    #[serde(default)]
    company_size: String,
    #[serde(default)]
    skills: Vec<Skill>,
    #[serde(default)]
    employment_types: Vec<Contract>,
}

#[derive(Debug, Deserialize)]
struct Skill {
    name: String,
    level: Value,
}

#[derive(Debug, Deserialize)]
struct Contract {
    #[serde(default)]
    salary: Option<Salary>,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Salary {
    from: Value,
    to: Value,
    currency: String,
}

/// The API returns every offer at once, so there is never a next page.
pub(super) fn parse(content: &RawContent, _host: &str) -> Result<AvailabilityPage> {
    let Some(Value::Array(offers)) = content.json() else {
        return Err(AppError::parse("justjoin.it response is not an array of offers"));
    };

    let mut page = AvailabilityPage::default();

    for offer in offers {
        let Ok(offer) = serde_json::from_value::<Offer>(offer) else {
            continue;
        };
        page.items.insert(
            offer.id.clone(),
            AvailabilityRecord {
                url: format!("{OFFER_URL_BASE}{}", offer.id),
                name: describe(&offer),
                available: true,
            },
        );
    }

    Ok(page)
}

fn describe(offer: &Offer) -> String {
    let skills = offer
        .skills
        .iter()
        .map(|s| format!("{}({})", s.name, plain(&s.level)))
        .collect::<Vec<_>>()
        .join(", ");

    let salaries = offer
        .employment_types
        .iter()
        .map(|c| {
            let salary = match &c.salary {
                Some(s) => format!("{}-{}{}", plain(&s.from), plain(&s.to), s.currency),
                None => "?".to_string(),
            };
            format!("{salary} ({})", c.kind)
        })
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "{} ({})\n🏢 company: {}({})\n⭐️ skills: {}\n💶 salary: {}\n",
        offer.title, offer.experience_level, offer.company_name, offer.company_size, skills, salaries
    )
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
