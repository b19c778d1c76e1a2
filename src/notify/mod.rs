//! Change notifications.
//!
//! - `markdown`: MarkdownV2 escaping
//! - `compose`: rendering change sets into size-bounded messages
//! - `telegram`: Telegram Bot API transport

pub mod compose;
pub mod markdown;
pub mod telegram;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Settings;

pub use compose::{availability_messages, price_messages, split_message};
pub use telegram::TelegramBot;

/// Outbound chat transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one pre-formatted MarkdownV2 message.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Delivers composed messages to the configured chat.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn Transport>,
    chat_id: String,
    interval: Duration,
    char_limit: usize,
}

impl Notifier {
    pub fn new(
        transport: Arc<dyn Transport>,
        chat_id: impl Into<String>,
        interval: Duration,
        char_limit: usize,
    ) -> Self {
        Self {
            transport,
            chat_id: chat_id.into(),
            interval,
            char_limit,
        }
    }

    pub fn from_settings(transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        Self::new(
            transport,
            settings.chat_id.clone(),
            settings.message_interval,
            settings.message_char_limit,
        )
    }

    /// Character budget of one message.
    pub fn char_limit(&self) -> usize {
        self.char_limit
    }

    /// Send messages in order. Returns how many were delivered.
    pub async fn send(&self, messages: &[String]) -> usize {
        deliver(self.transport.as_ref(), &self.chat_id, messages, self.interval).await
    }
}

/// Send messages one at a time, pausing `delay` after each.
///
/// A failed send is logged and does not stop the remaining messages.
/// Returns how many messages were accepted by the transport.
pub async fn deliver(
    transport: &dyn Transport,
    chat_id: &str,
    messages: &[String],
    delay: Duration,
) -> usize {
    let mut sent = 0;

    for (i, message) in messages.iter().enumerate() {
        match transport.send_message(chat_id, message).await {
            Ok(()) => sent += 1,
            Err(e) => log::error!("Failed to send message {}/{}: {e}", i + 1, messages.len()),
        }
        tokio::time::sleep(delay).await;
    }

    if sent < messages.len() {
        log::warn!("Delivered {sent}/{} messages", messages.len());
    }
    sent
}
