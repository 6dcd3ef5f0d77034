//! Chat message rendering.

use crate::command::{CommandKeywords, HELP_KEYWORD};
use carry_core::{AlertEvent, Coin, Recommendation};
use carry_engine::WatchConfig;
use chrono::{DateTime, Utc};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━";

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Render seconds as `H:MM:SS`, with a leading `-` once settlement has passed.
pub fn format_countdown(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let total = seconds.abs().floor() as u64;
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

fn headline(kind: Recommendation) -> &'static str {
    match kind {
        Recommendation::Enter => "🔺 Entry recommended",
        Recommendation::Exit => "🔻 Exit recommended",
    }
}

/// Format an alert event as an HTML chat message.
pub fn format_alert_message(event: &AlertEvent) -> String {
    let r = &event.report;
    format!(
        "{rule}\n\
         {headline} - <b>{contract}</b>\n\
         {rule}\n\
         💱 <b>Spot price</b> : {spot} USDT\n\
         📈 <b>Futures price</b> : {futures} USDT\n\
         ↔️ <b>Spot-futures gap</b> : {gap:.6}%\n\n\
         ⏳ <b>Funding interval</b> : {interval}h\n\
         💸 <b>Funding rate</b> : {rate}%\n\
         🕒 <b>Next funding in</b> : {countdown}\n\n\
         📌 <b>APR</b> : {apr}%\n\
         📅 <b>Daily APR</b> : {daily_apr}%\n\
         💰 <b>Daily funding fee</b> : {daily_fee}%\n\
         📊 <b>Expected daily return</b> : {expected}%",
        rule = RULE,
        headline = headline(event.kind),
        contract = event.contract(),
        spot = r.spot_price,
        futures = r.futures_price,
        gap = r.gap_pct,
        interval = r.funding_interval_hours,
        rate = round4(r.funding_rate_pct),
        countdown = format_countdown(r.seconds_to_funding),
        apr = r.annual_yield_pct,
        daily_apr = round4(r.daily_yield_pct),
        daily_fee = round4(r.daily_funding_fee_pct),
        expected = r.expected_daily_return_pct,
    )
}

fn join_or_none(coins: &[Coin]) -> String {
    if coins.is_empty() {
        "none".to_string()
    } else {
        coins
            .iter()
            .map(Coin::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Summary of the universe, tracked and entered sets.
pub fn format_status(watch: &WatchConfig) -> String {
    let universe = watch.universe();
    let tracked = watch.tracked_coins();
    let entered = watch.entered_coins();

    format!(
        "<b>📊 Current status</b>\n\n\
         🔹 Eligible coins ({})\n{}\n\n\
         🔸 Watching ({})\n{}\n\n\
         🚀 Entered ({})\n{}",
        universe.len(),
        join_or_none(&universe),
        tracked.len(),
        join_or_none(&tracked),
        entered.len(),
        join_or_none(&entered),
    )
}

/// Command list generated from the active keyword table.
pub fn help_text(keywords: &CommandKeywords) -> String {
    format!(
        "<b>📘 Commands</b>\n\n\
         ▶ <b>{help}</b> : this help\n\
         ▶ <b>{stop}</b> / <b>{start}</b>\n\
         ▶ <b>{status}</b> / <b>{reset}</b>\n\
         ▶ <b>{add} [coin]</b> / <b>{remove} [coin]</b>\n\
         ▶ <b>{enter} [coin]</b>\n\
         ▶ <b>{threshold} [open,close]</b>\n\
         ▶ <b>{interval} [seconds]</b>\n",
        help = HELP_KEYWORD,
        stop = keywords.stop,
        start = keywords.start,
        status = keywords.status,
        reset = keywords.reset,
        add = keywords.add,
        remove = keywords.remove,
        enter = keywords.enter,
        threshold = keywords.threshold,
        interval = keywords.interval,
    )
}

pub fn startup_message(now: DateTime<Utc>) -> String {
    format!(
        "✅ <b>Coin monitor started.</b>\nSend <b>{}</b> to list commands.\n\n⏰ {}",
        HELP_KEYWORD,
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use carry_core::SignalReport;
    use pretty_assertions::assert_eq;

    fn coin(s: &str) -> Coin {
        Coin::new(s).unwrap()
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0.0), "0:00:00");
        assert_eq!(format_countdown(5025.7), "1:23:45");
        assert_eq!(format_countdown(90_000.0), "25:00:00");
        assert_eq!(format_countdown(-300.0), "-0:05:00");
    }

    #[test]
    fn test_alert_message_contains_figures() {
        let event = AlertEvent {
            coin: coin("ABC"),
            kind: Recommendation::Enter,
            report: SignalReport {
                spot_price: 100.0,
                futures_price: 99.0,
                gap_pct: 1.0101010101,
                funding_interval_hours: 8.0,
                funding_rate_pct: 0.01,
                seconds_to_funding: 3600.0,
                funding_times_per_day: 3,
                annual_yield_pct: 36.5,
                daily_yield_pct: 0.1,
                daily_funding_fee_pct: -0.03,
                expected_daily_return_pct: 0.13,
            },
        };

        let msg = format_alert_message(&event);
        assert!(msg.contains("🔺 Entry recommended - <b>ABC_USDT</b>"));
        assert!(msg.contains("<b>Spot price</b> : 100 USDT"));
        assert!(msg.contains("<b>Futures price</b> : 99 USDT"));
        assert!(msg.contains("1.010101%"));
        assert!(msg.contains("<b>Funding interval</b> : 8h"));
        assert!(msg.contains("<b>Next funding in</b> : 1:00:00"));
        assert!(msg.contains("<b>Daily funding fee</b> : -0.03%"));
        assert!(msg.contains("<b>Expected daily return</b> : 0.13%"));
    }

    #[test]
    fn test_exit_headline() {
        assert_eq!(headline(Recommendation::Exit), "🔻 Exit recommended");
    }

    #[test]
    fn test_status_lists_sets() {
        let watch = WatchConfig::default();
        watch.replace_universe(vec![coin("ABC"), coin("XYZ")]);
        watch.enter(coin("ABC"));

        let status = format_status(&watch);
        assert!(status.contains("Eligible coins (2)\nABC, XYZ"));
        assert!(status.contains("Watching (1)\nABC"));
        assert!(status.contains("Entered (1)\nABC"));

        watch.reset();
        let status = format_status(&watch);
        assert!(status.contains("Watching (0)\nnone"));
    }

    #[test]
    fn test_help_uses_keyword_table() {
        let help = help_text(&CommandKeywords::english());
        assert!(help.contains("<b>ADD [coin]</b> / <b>REMOVE [coin]</b>"));
        assert!(help.contains("<b>THRESHOLD [open,close]</b>"));
        assert!(help_text(&CommandKeywords::korean()).contains("<b>주기 [seconds]</b>"));
    }

    #[test]
    fn test_startup_message() {
        use chrono::TimeZone;
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let msg = startup_message(now);
        assert!(msg.contains("<b>/</b>"));
        assert!(msg.ends_with("2024-05-01 12:00:00 UTC"));
    }
}
