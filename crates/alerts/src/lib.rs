//! Telegram side of the carry bot.
//!
//! This crate provides:
//! - Alert and status message rendering
//! - The localized chat command parser
//! - The command interpreter loop
//! - The Telegram transport for alerts and commands

pub mod command;
pub mod format;
pub mod interpreter;
pub mod telegram;

pub use command::{Command, CommandError, CommandKeywords, CommandParser, Locale, HELP_KEYWORD};
pub use format::{format_alert_message, format_countdown, format_status, help_text, startup_message};
pub use interpreter::{apply_command, CommandInterpreter, InboundMessage, Messenger};
pub use telegram::{TelegramBot, TelegramConfig, TelegramError};
