//! Telegram transport.

use crate::format::format_alert_message;
use crate::interpreter::{InboundMessage, Messenger};
use async_trait::async_trait;
use carry_core::AlertEvent;
use carry_engine::{AlertSink, DeliveryError};
use std::future::Future;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, UpdateKind};
use thiserror::Error;
use tracing::debug;

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("Invalid chat id: {0}")]
    InvalidChatId(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Bound a request by `limit`, independent of the client-wide timeout.
async fn with_deadline<T, F>(limit: Duration, request: F) -> Result<T, TelegramError>
where
    F: Future<Output = Result<T, TelegramError>>,
{
    tokio::time::timeout(limit, request)
        .await
        .map_err(|_| TelegramError::Timeout(limit))?
}

/// Bot credentials and polling parameters.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    /// The only chat that receives alerts and may issue commands.
    pub chat_id: String,
    /// Provider-side wait for `getUpdates`.
    pub long_poll_secs: u32,
    /// Timeout for every other request.
    pub request_timeout: Duration,
}

impl TelegramConfig {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, TelegramError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`; empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TelegramError> {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(TelegramError::MissingEnv(key))
        };

        Ok(Self {
            token: get(TOKEN_ENV)?,
            chat_id: get(CHAT_ID_ENV)?,
            long_poll_secs: 60,
            request_timeout: Duration::from_secs(10),
        })
    }

    pub fn with_long_poll_secs(mut self, secs: u32) -> Self {
        self.long_poll_secs = secs;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Telegram bot bound to a single chat.
pub struct TelegramBot {
    bot: Bot,
    chat_id: ChatId,
    long_poll_secs: u32,
    send_timeout: Duration,
}

impl TelegramBot {
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let chat_id = config
            .chat_id
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| TelegramError::InvalidChatId(config.chat_id.clone()))?;

        // The client must outlive the long-poll wait; sends get their own
        // deadline in `send_html`.
        let timeout = config
            .request_timeout
            .max(Duration::from_secs(u64::from(config.long_poll_secs) + 10));
        let client = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()
            .map_err(|e| TelegramError::Transport(e.to_string()))?;

        Ok(Self {
            bot: Bot::with_client(&config.token, client),
            chat_id,
            long_poll_secs: config.long_poll_secs,
            send_timeout: config.request_timeout,
        })
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Send an HTML message to the configured chat.
    pub async fn send_html(&self, text: &str) -> Result<(), TelegramError> {
        with_deadline(self.send_timeout, async {
            self.bot
                .send_message(self.chat_id, text)
                .parse_mode(ParseMode::Html)
                .await?;
            Ok::<(), TelegramError>(())
        })
        .await
    }
}

#[async_trait]
impl Messenger for TelegramBot {
    async fn send(&self, text: &str) -> Result<(), TelegramError> {
        self.send_html(text).await
    }

    async fn poll_messages(&self, offset: Option<u64>) -> Result<Vec<InboundMessage>, TelegramError> {
        let mut request = self.bot.get_updates().timeout(self.long_poll_secs);
        if let Some(offset) = offset {
            request = request.offset(i32::try_from(offset).unwrap_or(i32::MAX));
        }
        let updates = request.await?;
        debug!(count = updates.len(), "Fetched updates");

        Ok(updates
            .into_iter()
            .map(|update| {
                let id = u64::from(update.id.0);
                match update.kind {
                    UpdateKind::Message(msg) => InboundMessage {
                        id,
                        sender_id: Some(msg.chat.id.0.to_string()),
                        text: msg.text().unwrap_or_default().to_string(),
                    },
                    // Other update kinds only move the cursor.
                    _ => InboundMessage {
                        id,
                        sender_id: None,
                        text: String::new(),
                    },
                }
            })
            .collect())
    }
}

#[async_trait]
impl AlertSink for TelegramBot {
    async fn deliver(&self, event: &AlertEvent) -> Result<(), DeliveryError> {
        self.send_html(&format_alert_message(event))
            .await
            .map_err(|e| DeliveryError(e.to_string()))
    }
}
