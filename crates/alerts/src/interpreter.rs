//! Command interpreter loop.
//!
//! Polls the chat transport for inbound messages, applies recognised commands
//! to the shared watch configuration and replies once per command.

use crate::command::{Command, CommandError, CommandKeywords, CommandParser};
use crate::format::{format_status, help_text};
use crate::telegram::TelegramError;
use async_trait::async_trait;
use carry_engine::{SharedWatch, WatchConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// An inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Transport-assigned, monotonically increasing id.
    pub id: u64,
    /// Sender identity; None for updates without a chat.
    pub sender_id: Option<String>,
    pub text: String,
}

/// Two-way chat transport used by the interpreter.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message to the configured recipient.
    async fn send(&self, text: &str) -> Result<(), TelegramError>;

    /// Fetch messages with id >= `offset`, waiting on the provider side if
    /// nothing is pending.
    async fn poll_messages(&self, offset: Option<u64>) -> Result<Vec<InboundMessage>, TelegramError>;
}

/// Apply one command and return its reply.
///
/// Rejected commands leave the configuration untouched.
pub fn apply_command(
    watch: &WatchConfig,
    keywords: &CommandKeywords,
    command: Command,
) -> Result<String, CommandError> {
    let reply = match command {
        Command::Help => help_text(keywords),
        Command::Stop => {
            watch.set_alerts_enabled(false);
            "⛔ Alerts paused.".to_string()
        }
        Command::Start => {
            watch.set_alerts_enabled(true);
            "✅ Alerts resumed.".to_string()
        }
        Command::Status => format_status(watch),
        Command::Reset => {
            watch.reset();
            "♻️ Watch list cleared.".to_string()
        }
        Command::Interval(secs) => {
            watch.set_poll_interval_secs(secs);
            format!("⏱️ Poll interval: {}s", secs)
        }
        Command::Add(coin) => {
            if !watch.in_universe(&coin) {
                return Err(CommandError::UnknownCoin(coin));
            }
            let reply = format!("➕ {} added to watch list.", coin);
            watch.track(coin);
            reply
        }
        Command::Remove(coin) => {
            watch.untrack(&coin);
            format!("🛑 {} removed from watch list.", coin)
        }
        Command::Enter(coin) => {
            if !watch.in_universe(&coin) {
                return Err(CommandError::UnknownCoin(coin));
            }
            let reply = format!("🚀 {} marked as entered.", coin);
            watch.enter(coin);
            reply
        }
        Command::Threshold(thresholds) => {
            watch.set_thresholds(thresholds);
            format!(
                "📈 Thresholds: open {} / close {}",
                thresholds.open, thresholds.close
            )
        }
    };
    Ok(reply)
}

/// Inbound command loop.
pub struct CommandInterpreter {
    messenger: Arc<dyn Messenger>,
    watch: SharedWatch,
    parser: CommandParser,
    recipient: String,
    retry_delay: Duration,
}

impl CommandInterpreter {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        watch: SharedWatch,
        keywords: CommandKeywords,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            messenger,
            watch,
            parser: CommandParser::new(keywords),
            recipient: recipient.into(),
            retry_delay: Duration::from_secs(3),
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Run forever.
    pub async fn run(self) {
        info!(recipient = %self.recipient, "Starting command interpreter");

        loop {
            match self.poll_once().await {
                Ok(0) => {}
                Ok(handled) => debug!(handled, "Commands handled"),
                Err(e) => warn!(error = %e, "Failed to poll for commands"),
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    /// Fetch one batch of messages and handle them in order.
    ///
    /// Returns the number of commands that were recognised.
    pub async fn poll_once(&self) -> Result<usize, TelegramError> {
        let messages = self
            .messenger
            .poll_messages(self.watch.next_command_offset())
            .await?;

        let mut handled = 0;
        for message in messages {
            self.watch.advance_command_cursor(message.id);

            if message.sender_id.as_deref() != Some(self.recipient.as_str()) {
                debug!(id = message.id, sender = ?message.sender_id, "Ignoring message from other sender");
                continue;
            }

            let Some(parsed) = self.parser.parse(&message.text) else {
                continue;
            };
            info!(id = message.id, text = %message.text.trim(), "Command received");
            handled += 1;

            let reply = match parsed
                .and_then(|command| apply_command(&self.watch, self.parser.keywords(), command))
            {
                Ok(reply) => reply,
                Err(e) => {
                    info!(id = message.id, error = %e, "Command rejected");
                    e.reply()
                }
            };

            if let Err(e) = self.messenger.send(&reply).await {
                warn!(id = message.id, error = %e, "Failed to send command reply");
            }
        }

        Ok(handled)
    }
}
