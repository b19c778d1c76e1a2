//! Conversational surface: command dispatch and the long-poll loop.

pub mod command;

use std::sync::Arc;
use std::time::Duration;

use crate::intake::{IntakeFlow, IntakeListener, SessionStore};
use crate::notify::Transport;
use crate::notify::markdown::escape;
use crate::notify::telegram::{IncomingMessage, TelegramBot};
use crate::parsers::ParserRegistry;
use crate::pipeline::{CycleKind, ScanRequests};

pub use command::{Command, Parsed, parse};

/// Pause after a failed `getUpdates` call.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Turns incoming chat messages into replies and side effects.
pub struct Dispatcher {
    chat_id: String,
    sessions: SessionStore,
    listener: Arc<dyn IntakeListener>,
    registry: Arc<ParserRegistry>,
    scan_requests: ScanRequests,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    /// Only messages from `chat_id` are served.
    pub fn new(
        chat_id: impl Into<String>,
        listener: Arc<dyn IntakeListener>,
        registry: Arc<ParserRegistry>,
        scan_requests: ScanRequests,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            sessions: SessionStore::new(),
            listener,
            registry,
            scan_requests,
            transport,
        }
    }

    /// Handle one message and send the reply, if any.
    pub async fn handle(&self, message: &IncomingMessage) {
        if message.chat_id != self.chat_id {
            log::debug!("Ignoring message from chat {}", message.chat_id);
            return;
        }

        let Some(reply) = self.reply_to(message.user_id, &message.text).await else {
            return;
        };
        if let Err(e) = self
            .transport
            .send_message(&message.chat_id, &escape(&reply))
            .await
        {
            log::error!("Failed to reply to user {}: {e}", message.user_id);
        }
    }

    /// Plain-text reply for `text` sent by `user`.
    pub async fn reply_to(&self, user: i64, text: &str) -> Option<String> {
        match parse(text) {
            Parsed::Command(Command::Help) => Some(Command::help_text()),
            Parsed::Command(Command::Add) => {
                let names = self
                    .registry
                    .price_parser_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                self.sessions.start(user, IntakeFlow::price_item(names)).await
            }
            Parsed::Command(Command::List) => Some("Not implemented yet.".to_string()),
            Parsed::Command(Command::Scan) => Some(self.request_scan()),
            Parsed::Command(Command::Cancel) => Some(if self.sessions.cancel(user).await {
                "Cancelled.".to_string()
            } else {
                "Nothing to cancel.".to_string()
            }),
            Parsed::Unknown(word) => Some(format!(
                "Unknown command /{word}. Send /help for the list."
            )),
            Parsed::Text(text) => self.sessions.handle(user, text, self.listener.as_ref()).await,
        }
    }

    fn request_scan(&self) -> String {
        let queued = CycleKind::ALL
            .iter()
            .all(|kind| self.scan_requests.send(*kind).is_ok());
        if queued {
            "Scan queued.".to_string()
        } else {
            log::error!("Scan requested but the scheduler is not running");
            "Scanning is not available right now.".to_string()
        }
    }
}

/// Register commands, then poll for messages until the process ends.
pub async fn run_bot(bot: Arc<TelegramBot>, dispatcher: Dispatcher) {
    if let Err(e) = bot.set_commands(&Command::menu()).await {
        log::warn!("Failed to register bot commands: {e}");
    }
    log::info!("Bot is listening for commands");

    let mut offset = 0;
    loop {
        match bot.get_updates(offset).await {
            Ok((messages, last_id)) => {
                if let Some(last_id) = last_id {
                    offset = last_id + 1;
                }
                for message in &messages {
                    dispatcher.handle(message).await;
                }
            }
            Err(e) => {
                log::warn!("Polling for updates failed: {e}");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}
