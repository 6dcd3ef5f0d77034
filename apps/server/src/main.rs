//! Carry Bot - Headless Server
//!
//! Watches Gate.io funding and launch-pool yields for a chat-curated set of
//! coins and sends carry entry/exit alerts over Telegram.

mod config;
mod health;

use carry_alerts::{startup_message, CommandInterpreter, CommandKeywords, Locale, Messenger, TelegramBot};
use carry_engine::{MarketSampler, WatchConfig};
use carry_feeds::GateIoRestClient;
use chrono::Utc;
use clap::Parser;
use config::{AppConfig, ConfigError};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Carry Bot CLI
#[derive(Parser, Debug)]
#[command(name = "carry-bot")]
#[command(about = "Funding-carry alert bot for Gate.io", long_about = None)]
struct Args {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Liveness endpoint port [default: 8080]
    #[arg(long)]
    port: Option<u16>,

    /// Initial sampler interval in seconds [default: 30]
    #[arg(short, long)]
    interval: Option<u64>,

    /// Entry threshold, expected daily return in percent [default: 0.4]
    #[arg(long, allow_negative_numbers = true)]
    open_threshold: Option<f64>,

    /// Exit threshold, expected daily return in percent [default: 1.0]
    #[arg(long, allow_negative_numbers = true)]
    close_threshold: Option<f64>,

    /// Command keyword language: ko, en [default: ko]
    #[arg(long)]
    locale: Option<Locale>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    /// Layer CLI flags over the loaded configuration.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(interval) = self.interval {
            config.poll_interval_secs = interval;
        }
        if let Some(open) = self.open_threshold {
            config.open_threshold = open;
        }
        if let Some(close) = self.close_threshold {
            config.close_threshold = close;
        }
        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn load_config(args: &Args) -> Result<AppConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    args.apply(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            init_logging(args.log_level.as_deref().unwrap_or("info"));
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.log_level);

    info!("🚀 Carry Bot starting...");
    info!("  Interval: {}s", config.poll_interval_secs);
    info!(
        "  Thresholds: open {} / close {}",
        config.open_threshold, config.close_threshold
    );
    info!("  Locale: {:?}", config.locale);
    info!("  Liveness Port: {}", config.port);

    let telegram = config
        .telegram()
        .and_then(|tg| TelegramBot::new(&tg).map_err(ConfigError::from));
    let telegram = match telegram {
        Ok(bot) => Arc::new(bot),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let market = match GateIoRestClient::new(config.request_timeout()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build market data client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = health::start_health_server(config.port).await {
        error!("Failed to start liveness endpoint: {}", e);
        return ExitCode::FAILURE;
    }

    let watch = WatchConfig::shared(config.watch_defaults());

    if let Err(e) = telegram.send(&startup_message(Utc::now())).await {
        warn!("Failed to send startup notification: {}", e);
    }

    let sampler = MarketSampler::new(market, telegram.clone(), watch.clone());
    tokio::spawn(sampler.run());

    let interpreter = CommandInterpreter::new(
        telegram.clone(),
        watch,
        CommandKeywords::for_locale(config.locale),
        telegram.chat_id().0.to_string(),
    )
    .with_retry_delay(config.command_poll());
    tokio::spawn(interpreter.run());

    info!("Press Ctrl+C to stop...");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }

    warn!("Shutdown signal received");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "carry-bot",
            "--interval",
            "90",
            "--open-threshold",
            "-0.2",
            "--locale",
            "en",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.poll_interval_secs, 90);
        assert_eq!(config.open_threshold, -0.2);
        assert_eq!(config.close_threshold, 1.0);
        assert_eq!(config.locale, Locale::English);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_missing_config_file_fails() {
        let args = Args::parse_from(["carry-bot", "--config", "/nonexistent/carry-bot.json"]);
        assert!(matches!(load_config(&args), Err(ConfigError::Io { .. })));
    }
}
