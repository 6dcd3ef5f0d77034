//! Chat command keywords and parsing.

use carry_core::Coin;
use carry_engine::Thresholds;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Keyword that always shows the help text, whatever the locale.
pub const HELP_KEYWORD: &str = "/";

/// Language of the command keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    #[serde(alias = "ko")]
    Korean,
    #[serde(alias = "en")]
    English,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ko" | "kr" | "korean" => Ok(Locale::Korean),
            "en" | "english" => Ok(Locale::English),
            other => Err(format!("unknown locale: {}", other)),
        }
    }
}

/// Keyword for each command, matched against upper-cased input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandKeywords {
    pub stop: String,
    pub start: String,
    pub status: String,
    pub reset: String,
    pub interval: String,
    pub add: String,
    pub remove: String,
    pub enter: String,
    pub threshold: String,
}

impl Default for CommandKeywords {
    fn default() -> Self {
        Self::korean()
    }
}

impl CommandKeywords {
    pub fn korean() -> Self {
        Self {
            stop: "중지".into(),
            start: "실행".into(),
            status: "정보".into(),
            reset: "초기화".into(),
            interval: "주기".into(),
            add: "추가".into(),
            remove: "제거".into(),
            enter: "진입".into(),
            threshold: "기준".into(),
        }
    }

    pub fn english() -> Self {
        Self {
            stop: "STOP".into(),
            start: "START".into(),
            status: "STATUS".into(),
            reset: "RESET".into(),
            interval: "INTERVAL".into(),
            add: "ADD".into(),
            remove: "REMOVE".into(),
            enter: "ENTER".into(),
            threshold: "THRESHOLD".into(),
        }
    }

    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Korean => Self::korean(),
            Locale::English => Self::english(),
        }
    }

    /// Upper-case every keyword so lookups match normalized input.
    fn normalized(mut self) -> Self {
        for keyword in [
            &mut self.stop,
            &mut self.start,
            &mut self.status,
            &mut self.reset,
            &mut self.interval,
            &mut self.add,
            &mut self.remove,
            &mut self.enter,
            &mut self.threshold,
        ] {
            *keyword = keyword.trim().to_uppercase();
        }
        self
    }

    pub fn interval_usage(&self) -> String {
        format!("{} 180", self.interval)
    }

    pub fn coin_usage(&self, keyword: &str) -> String {
        format!("{} DMC", keyword)
    }

    pub fn threshold_usage(&self) -> String {
        format!("{} 0.4,1", self.threshold)
    }
}

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Stop,
    Start,
    Status,
    Reset,
    Interval(u64),
    Add(Coin),
    Remove(Coin),
    Enter(Coin),
    Threshold(Thresholds),
}

/// A recognised command that cannot be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// Argument missing or malformed.
    #[error("format error, usage: {usage}")]
    Format { usage: String },
    /// Coin not in the current yield universe.
    #[error("unknown coin: {0}")]
    UnknownCoin(Coin),
}

impl CommandError {
    fn format(usage: String) -> Self {
        CommandError::Format { usage }
    }

    /// Chat reply for this rejection.
    pub fn reply(&self) -> String {
        match self {
            CommandError::Format { usage } => format!("⚠️ Format error. Usage: {}", usage),
            CommandError::UnknownCoin(coin) => format!("⚠️ Unknown coin: {}", coin),
        }
    }
}

/// Turns chat text into commands using a keyword table.
#[derive(Debug, Clone)]
pub struct CommandParser {
    keywords: CommandKeywords,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(CommandKeywords::default())
    }
}

impl CommandParser {
    pub fn new(keywords: CommandKeywords) -> Self {
        Self {
            keywords: keywords.normalized(),
        }
    }

    pub fn keywords(&self) -> &CommandKeywords {
        &self.keywords
    }

    /// Parse one message.
    ///
    /// `None` means the text is not a command and should be ignored without a
    /// reply; `Some(Err(_))` is a recognised command with a bad argument.
    pub fn parse(&self, text: &str) -> Option<Result<Command, CommandError>> {
        let normalized = text.trim().to_uppercase();
        if normalized == HELP_KEYWORD {
            return Some(Ok(Command::Help));
        }

        let (head, rest) = match normalized.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (normalized.as_str(), ""),
        };
        let kw = &self.keywords;

        if rest.is_empty() {
            if head == kw.stop {
                return Some(Ok(Command::Stop));
            }
            if head == kw.start {
                return Some(Ok(Command::Start));
            }
            if head == kw.status {
                return Some(Ok(Command::Status));
            }
            if head == kw.reset {
                return Some(Ok(Command::Reset));
            }
        }

        if head == kw.interval {
            return Some(self.parse_interval(rest));
        }
        if head == kw.add {
            return Some(self.parse_coin(rest, &kw.add).map(Command::Add));
        }
        if head == kw.remove {
            return Some(self.parse_coin(rest, &kw.remove).map(Command::Remove));
        }
        if head == kw.enter {
            return Some(self.parse_coin(rest, &kw.enter).map(Command::Enter));
        }
        if head == kw.threshold {
            return Some(self.parse_thresholds(rest));
        }

        None
    }

    fn parse_interval(&self, rest: &str) -> Result<Command, CommandError> {
        let usage = || CommandError::format(self.keywords.interval_usage());
        let secs = rest
            .split_whitespace()
            .next()
            .ok_or_else(usage)?
            .parse::<u64>()
            .map_err(|_| usage())?;
        if secs == 0 {
            return Err(usage());
        }
        Ok(Command::Interval(secs))
    }

    fn parse_coin(&self, rest: &str, keyword: &str) -> Result<Coin, CommandError> {
        rest.split_whitespace()
            .next()
            .and_then(|token| Coin::new(token).ok())
            .ok_or_else(|| CommandError::format(self.keywords.coin_usage(keyword)))
    }

    fn parse_thresholds(&self, rest: &str) -> Result<Command, CommandError> {
        let usage = || CommandError::format(self.keywords.threshold_usage());
        let compact: String = rest.chars().filter(|c| !c.is_whitespace()).collect();

        let (open, close) = compact.split_once(',').ok_or_else(usage)?;
        let open = open.parse::<f64>().map_err(|_| usage())?;
        let close = close.parse::<f64>().map_err(|_| usage())?;
        if !open.is_finite() || !close.is_finite() {
            return Err(usage());
        }

        Ok(Command::Threshold(Thresholds { open, close }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn coin(s: &str) -> Coin {
        Coin::new(s).unwrap()
    }

    fn english() -> CommandParser {
        CommandParser::new(CommandKeywords::english())
    }

    #[test]
    fn test_help_in_every_locale() {
        assert_eq!(english().parse(" / "), Some(Ok(Command::Help)));
        assert_eq!(CommandParser::default().parse("/"), Some(Ok(Command::Help)));
    }

    #[test]
    fn test_simple_commands_case_insensitive() {
        let parser = english();
        assert_eq!(parser.parse("stop"), Some(Ok(Command::Stop)));
        assert_eq!(parser.parse("  Start "), Some(Ok(Command::Start)));
        assert_eq!(parser.parse("STATUS"), Some(Ok(Command::Status)));
        assert_eq!(parser.parse("reset"), Some(Ok(Command::Reset)));
    }

    #[test]
    fn test_korean_keywords() {
        let parser = CommandParser::default();
        assert_eq!(parser.parse("중지"), Some(Ok(Command::Stop)));
        assert_eq!(parser.parse("추가 dmc"), Some(Ok(Command::Add(coin("DMC")))));
        assert_eq!(parser.parse("주기 180"), Some(Ok(Command::Interval(180))));
        assert_eq!(parser.parse("STOP"), None);
    }

    #[test]
    fn test_unrecognized_text_is_ignored() {
        let parser = english();
        assert_eq!(parser.parse("hello"), None);
        assert_eq!(parser.parse("stop now"), None);
        assert_eq!(parser.parse(""), None);
    }

    #[test]
    fn test_interval() {
        let parser = english();
        assert_eq!(parser.parse("interval 60"), Some(Ok(Command::Interval(60))));
        for bad in ["interval abc", "interval", "interval -5", "interval 0"] {
            assert_eq!(
                parser.parse(bad),
                Some(Err(CommandError::Format {
                    usage: "INTERVAL 180".to_string()
                })),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_coin_commands() {
        let parser = english();
        assert_eq!(parser.parse("add abc"), Some(Ok(Command::Add(coin("ABC")))));
        assert_eq!(parser.parse("remove abc"), Some(Ok(Command::Remove(coin("ABC")))));
        assert_eq!(parser.parse("enter abc extra"), Some(Ok(Command::Enter(coin("ABC")))));
        assert_eq!(
            parser.parse("add"),
            Some(Err(CommandError::Format {
                usage: "ADD DMC".to_string()
            }))
        );
    }

    #[test]
    fn test_thresholds() {
        let parser = english();
        assert_eq!(
            parser.parse("threshold 0.2,0.9"),
            Some(Ok(Command::Threshold(Thresholds { open: 0.2, close: 0.9 })))
        );
        assert_eq!(
            parser.parse("threshold 0.4, -1"),
            Some(Ok(Command::Threshold(Thresholds { open: 0.4, close: -1.0 })))
        );
        for bad in ["threshold 0.4", "threshold a,b", "threshold 1,2,3", "threshold nan,1", "threshold"] {
            assert!(
                matches!(parser.parse(bad), Some(Err(CommandError::Format { .. }))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_custom_keywords_are_normalized() {
        let mut keywords = CommandKeywords::english();
        keywords.stop = "halt".into();
        let parser = CommandParser::new(keywords);
        assert_eq!(parser.parse("HALT"), Some(Ok(Command::Stop)));
        assert_eq!(parser.parse("stop"), None);
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!("ko".parse::<Locale>(), Ok(Locale::Korean));
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::English));
        assert!("fr".parse::<Locale>().is_err());
    }
}
