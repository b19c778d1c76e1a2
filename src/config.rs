// src/config.rs

//! Settings loading utilities.
//!
//! Every value is required. A missing or non-numeric value is a
//! configuration error and stops startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::Settings;
use crate::models::config::{MESSAGE_CHAR_LIMIT, MESSAGE_INTERVAL};

pub const REQUEST_INTERVAL_SECONDS: &str = "REQUEST_INTERVAL_SECONDS";
pub const PRICE_CHECK_INTERVAL_MINUTES: &str = "PRICE_CHECK_INTERVAL_MINUTES";
pub const AVAILABILITY_CHECK_INTERVAL_MINUTES: &str = "AVAILABILITY_CHECK_INTERVAL_MINUTES";
pub const RESULTS_FOLDER: &str = "RESULTS_FOLDER";
pub const TRACKED_PRICES_JSON: &str = "TRACKED_PRICES_JSON";
pub const TRACKED_AVAILABILITY_JSON: &str = "TRACKED_AVAILABILITY_JSON";
pub const BOT_TOKEN: &str = "BOT_TOKEN";
pub const CHAT_ID: &str = "CHAT_ID";

/// Load a `.env` file if one exists, then read settings from the process
/// environment.
pub fn load_settings(env_file: Option<&Path>) -> Result<Settings> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| {
                AppError::config(format!("Failed to load env file {}: {e}", path.display()))
            })?;
        }
        None => {
            if let Err(e) = dotenvy::dotenv() {
                if !e.not_found() {
                    return Err(AppError::config(format!("Failed to load .env: {e}")));
                }
            }
        }
    }

    let vars: HashMap<String, String> = std::env::vars().collect();
    from_vars(&vars)
}

/// Build settings from a variable map.
pub fn from_vars(vars: &HashMap<String, String>) -> Result<Settings> {
    let settings = Settings {
        request_interval: seconds(number(vars, REQUEST_INTERVAL_SECONDS)?, REQUEST_INTERVAL_SECONDS)?,
        price_check_interval: seconds(
            number(vars, PRICE_CHECK_INTERVAL_MINUTES)? * 60.0,
            PRICE_CHECK_INTERVAL_MINUTES,
        )?,
        availability_check_interval: seconds(
            number(vars, AVAILABILITY_CHECK_INTERVAL_MINUTES)? * 60.0,
            AVAILABILITY_CHECK_INTERVAL_MINUTES,
        )?,
        results_dir: PathBuf::from(string(vars, RESULTS_FOLDER)?),
        tracked_prices_path: PathBuf::from(string(vars, TRACKED_PRICES_JSON)?),
        tracked_availability_path: PathBuf::from(string(vars, TRACKED_AVAILABILITY_JSON)?),
        bot_token: string(vars, BOT_TOKEN)?,
        chat_id: string(vars, CHAT_ID)?,
        message_interval: MESSAGE_INTERVAL,
        message_char_limit: MESSAGE_CHAR_LIMIT,
    };

    settings.validate()?;
    Ok(settings)
}

/// Read a required, non-empty string variable.
fn string(vars: &HashMap<String, String>, name: &str) -> Result<String> {
    match vars.get(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(AppError::config(format!(
            "Environment variable: {name} is not set."
        ))),
    }
}

/// Read a required numeric variable.
fn number(vars: &HashMap<String, String>, name: &str) -> Result<f64> {
    let raw = string(vars, name)?;
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| {
            AppError::config(format!("Environment variable: {name} is not a number."))
        })
}

fn seconds(value: f64, name: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| AppError::config(format!("Environment variable: {name} must not be negative.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_vars() -> HashMap<String, String> {
        [
            (REQUEST_INTERVAL_SECONDS, "1.5"),
            (PRICE_CHECK_INTERVAL_MINUTES, "30"),
            (AVAILABILITY_CHECK_INTERVAL_MINUTES, "10"),
            (RESULTS_FOLDER, "results"),
            (TRACKED_PRICES_JSON, "tracked_prices.json"),
            (TRACKED_AVAILABILITY_JSON, "tracked_availability.json"),
            (BOT_TOKEN, "123:abc"),
            (CHAT_ID, "-100200"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_reads_all_values() {
        let settings = from_vars(&full_vars()).unwrap();
        assert_eq!(settings.request_interval, Duration::from_millis(1500));
        assert_eq!(settings.price_check_interval, Duration::from_secs(1800));
        assert_eq!(settings.availability_check_interval, Duration::from_secs(600));
        assert_eq!(settings.results_dir, PathBuf::from("results"));
        assert_eq!(settings.chat_id, "-100200");
        assert_eq!(settings.message_char_limit, MESSAGE_CHAR_LIMIT);
    }

    #[test]
    fn test_missing_value_is_fatal() {
        let mut vars = full_vars();
        vars.remove(BOT_TOKEN);
        let err = from_vars(&vars).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("Environment variable: BOT_TOKEN is not set."));
    }

    #[test]
    fn test_non_numeric_value_is_fatal() {
        let mut vars = full_vars();
        vars.insert(REQUEST_INTERVAL_SECONDS.to_string(), "soon".to_string());
        let err = from_vars(&vars).unwrap_err();
        assert!(
            err.to_string()
                .contains("Environment variable: REQUEST_INTERVAL_SECONDS is not a number.")
        );
    }

    #[test]
    fn test_negative_interval_rejected() {
        let mut vars = full_vars();
        vars.insert(REQUEST_INTERVAL_SECONDS.to_string(), "-2".to_string());
        assert!(from_vars(&vars).is_err());
    }
}
