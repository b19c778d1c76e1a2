//! Application settings.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Maximum length of one outbound chat message.
pub const MESSAGE_CHAR_LIMIT: usize = 4096;

/// Pause between two consecutive outbound chat messages.
pub const MESSAGE_INTERVAL: Duration = Duration::from_secs(2);

/// Root application settings, read from the environment.
#[derive(Clone)]
pub struct Settings {
    /// Pause between two outbound page requests
    pub request_interval: Duration,

    /// Pause between two price cycles
    pub price_check_interval: Duration,

    /// Pause between two availability cycles
    pub availability_check_interval: Duration,

    /// Directory holding snapshots and scan archives
    pub results_dir: PathBuf,

    /// JSON file with tracked price items
    pub tracked_prices_path: PathBuf,

    /// JSON file with tracked availability sites
    pub tracked_availability_path: PathBuf,

    /// Telegram bot token
    pub bot_token: String,

    /// Chat receiving change notifications
    pub chat_id: String,

    /// Pause between two notification messages
    pub message_interval: Duration,

    /// Character budget of one notification message
    pub message_char_limit: usize,
}

impl Settings {
    /// Validate settings values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.price_check_interval.is_zero() {
            return Err(AppError::config(
                "PRICE_CHECK_INTERVAL_MINUTES must be greater than 0",
            ));
        }
        if self.availability_check_interval.is_zero() {
            return Err(AppError::config(
                "AVAILABILITY_CHECK_INTERVAL_MINUTES must be greater than 0",
            ));
        }
        if self.bot_token.trim().is_empty() {
            return Err(AppError::config("BOT_TOKEN is empty"));
        }
        if self.chat_id.trim().is_empty() {
            return Err(AppError::config("CHAT_ID is empty"));
        }
        if self.message_char_limit == 0 {
            return Err(AppError::config("message character limit must be > 0"));
        }
        Ok(())
    }
}

// The bot token must not leak through debug output.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("request_interval", &self.request_interval)
            .field("price_check_interval", &self.price_check_interval)
            .field(
                "availability_check_interval",
                &self.availability_check_interval,
            )
            .field("results_dir", &self.results_dir)
            .field("tracked_prices_path", &self.tracked_prices_path)
            .field("tracked_availability_path", &self.tracked_availability_path)
            .field("bot_token", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .field("message_interval", &self.message_interval)
            .field("message_char_limit", &self.message_char_limit)
            .finish()
    }
}
