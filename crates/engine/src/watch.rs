//! Shared watch configuration.
//!
//! One instance lives for the whole process and is handed to both the market
//! sampler and the command interpreter. Every field is individually
//! synchronized; multi-field updates (enter, remove, reset, thresholds) are
//! not atomic as a whole, so a concurrent reader may observe a half-applied
//! command. The field update order below keeps `entered ⊆ tracked` whenever a
//! single command runs at a time.

use crate::signal::Thresholds;
use carry_core::Coin;
use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Startup values for the watch configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchDefaults {
    pub poll_interval_secs: u64,
    pub open_threshold: f64,
    pub close_threshold: f64,
}

impl Default for WatchDefaults {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            open_threshold: 0.4,
            close_threshold: 1.0,
        }
    }
}

/// Watch state shared by the sampler and the command interpreter.
#[derive(Debug)]
pub struct WatchConfig {
    alerts_enabled: AtomicBool,
    tracked: DashSet<Coin>,
    entered: DashSet<Coin>,
    /// Latest yield universe, replaced wholesale each sampler cycle.
    universe: RwLock<Arc<Vec<Coin>>>,
    poll_interval_secs: AtomicU64,
    /// f64 bit patterns.
    open_threshold: AtomicU64,
    close_threshold: AtomicU64,
    /// Last consumed command id + 1; 0 means nothing consumed yet.
    command_offset: AtomicU64,
}

/// Handle passed to every task.
pub type SharedWatch = Arc<WatchConfig>;

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new(WatchDefaults::default())
    }
}

impl WatchConfig {
    pub fn new(defaults: WatchDefaults) -> Self {
        Self {
            alerts_enabled: AtomicBool::new(true),
            tracked: DashSet::new(),
            entered: DashSet::new(),
            universe: RwLock::new(Arc::new(Vec::new())),
            poll_interval_secs: AtomicU64::new(defaults.poll_interval_secs),
            open_threshold: AtomicU64::new(defaults.open_threshold.to_bits()),
            close_threshold: AtomicU64::new(defaults.close_threshold.to_bits()),
            command_offset: AtomicU64::new(0),
        }
    }

    pub fn shared(defaults: WatchDefaults) -> SharedWatch {
        Arc::new(Self::new(defaults))
    }

    // --- alert switch ---

    pub fn alerts_enabled(&self) -> bool {
        self.alerts_enabled.load(Ordering::Relaxed)
    }

    pub fn set_alerts_enabled(&self, enabled: bool) {
        self.alerts_enabled.store(enabled, Ordering::Relaxed);
    }

    // --- coin sets ---

    pub fn is_tracked(&self, coin: &Coin) -> bool {
        self.tracked.contains(coin)
    }

    pub fn is_entered(&self, coin: &Coin) -> bool {
        self.entered.contains(coin)
    }

    /// Start tracking a coin. Returns false if it was already tracked.
    pub fn track(&self, coin: Coin) -> bool {
        self.tracked.insert(coin)
    }

    /// Mark a coin as entered; it becomes tracked first.
    pub fn enter(&self, coin: Coin) {
        self.tracked.insert(coin.clone());
        self.entered.insert(coin);
    }

    /// Stop tracking a coin. Removing an absent coin is a no-op.
    pub fn untrack(&self, coin: &Coin) {
        self.entered.remove(coin);
        self.tracked.remove(coin);
    }

    /// Clear both tracked and entered sets.
    pub fn reset(&self) {
        self.entered.clear();
        self.tracked.clear();
    }

    /// Tracked coins, sorted for stable display.
    pub fn tracked_coins(&self) -> Vec<Coin> {
        Self::sorted(&self.tracked)
    }

    /// Entered coins, sorted for stable display.
    pub fn entered_coins(&self) -> Vec<Coin> {
        Self::sorted(&self.entered)
    }

    fn sorted(set: &DashSet<Coin>) -> Vec<Coin> {
        let mut coins: Vec<Coin> = set.iter().map(|c| c.key().clone()).collect();
        coins.sort();
        coins
    }

    // --- universe ---

    /// Replace the eligible coin universe with the latest observation.
    pub fn replace_universe(&self, coins: Vec<Coin>) {
        let mut guard = self.universe.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(coins);
    }

    /// Snapshot of the universe in provider listing order.
    pub fn universe(&self) -> Arc<Vec<Coin>> {
        self.universe
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn in_universe(&self, coin: &Coin) -> bool {
        self.universe().contains(coin)
    }

    // --- scalars ---

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.load(Ordering::Relaxed))
    }

    pub fn set_poll_interval_secs(&self, secs: u64) {
        self.poll_interval_secs.store(secs, Ordering::Relaxed);
    }

    pub fn open_threshold(&self) -> f64 {
        f64::from_bits(self.open_threshold.load(Ordering::Relaxed))
    }

    pub fn close_threshold(&self) -> f64 {
        f64::from_bits(self.close_threshold.load(Ordering::Relaxed))
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            open: self.open_threshold(),
            close: self.close_threshold(),
        }
    }

    /// Set both thresholds as given; no ordering between them is enforced.
    pub fn set_thresholds(&self, thresholds: Thresholds) {
        self.open_threshold
            .store(thresholds.open.to_bits(), Ordering::Relaxed);
        self.close_threshold
            .store(thresholds.close.to_bits(), Ordering::Relaxed);
    }

    // --- inbound command cursor ---

    /// Id of the last consumed inbound command, if any.
    pub fn last_seen_command(&self) -> Option<u64> {
        self.command_offset.load(Ordering::Acquire).checked_sub(1)
    }

    /// Offset to request the next batch of inbound commands from.
    pub fn next_command_offset(&self) -> Option<u64> {
        match self.command_offset.load(Ordering::Acquire) {
            0 => None,
            offset => Some(offset),
        }
    }

    /// Record a consumed command id. The cursor never moves backwards.
    pub fn advance_command_cursor(&self, id: u64) {
        self.command_offset
            .fetch_max(id.saturating_add(1), Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn coin(s: &str) -> Coin {
        Coin::new(s).unwrap()
    }

    fn subset_holds(watch: &WatchConfig) -> bool {
        watch
            .entered_coins()
            .iter()
            .all(|c| watch.is_tracked(c))
    }

    #[test]
    fn test_defaults() {
        let watch = WatchConfig::default();
        assert!(watch.alerts_enabled());
        assert_eq!(watch.poll_interval(), Duration::from_secs(30));
        assert_eq!(watch.open_threshold(), 0.4);
        assert_eq!(watch.close_threshold(), 1.0);
        assert!(watch.tracked_coins().is_empty());
        assert!(watch.universe().is_empty());
        assert_eq!(watch.last_seen_command(), None);
        assert_eq!(watch.next_command_offset(), None);
    }

    #[test]
    fn test_enter_also_tracks() {
        let watch = WatchConfig::default();
        watch.enter(coin("ABC"));
        assert!(watch.is_tracked(&coin("ABC")));
        assert!(watch.is_entered(&coin("ABC")));
        assert!(subset_holds(&watch));
    }

    #[test]
    fn test_untrack_removes_from_both_and_is_idempotent() {
        let watch = WatchConfig::default();
        watch.enter(coin("ABC"));
        watch.track(coin("XYZ"));

        watch.untrack(&coin("ABC"));
        let once = (watch.tracked_coins(), watch.entered_coins());
        watch.untrack(&coin("ABC"));
        let twice = (watch.tracked_coins(), watch.entered_coins());

        assert_eq!(once, twice);
        assert_eq!(once.0, vec![coin("XYZ")]);
        assert!(once.1.is_empty());
    }

    #[test]
    fn test_reset_clears_sets_only() {
        let watch = WatchConfig::default();
        watch.enter(coin("ABC"));
        watch.replace_universe(vec![coin("ABC")]);
        watch.set_poll_interval_secs(60);

        watch.reset();

        assert!(watch.tracked_coins().is_empty());
        assert!(watch.entered_coins().is_empty());
        assert!(watch.in_universe(&coin("ABC")));
        assert_eq!(watch.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_replace_universe_overwrites() {
        let watch = WatchConfig::default();
        watch.replace_universe(vec![coin("ABC"), coin("XYZ")]);
        watch.replace_universe(vec![coin("NEW")]);
        assert!(!watch.in_universe(&coin("ABC")));
        assert!(watch.in_universe(&coin("NEW")));
    }

    #[test]
    fn test_thresholds_unordered() {
        let watch = WatchConfig::default();
        watch.set_thresholds(Thresholds { open: 2.0, close: 0.5 });
        assert_eq!(watch.thresholds(), Thresholds { open: 2.0, close: 0.5 });
    }

    #[test]
    fn test_command_cursor_is_monotonic() {
        let watch = WatchConfig::default();
        watch.advance_command_cursor(10);
        assert_eq!(watch.last_seen_command(), Some(10));
        assert_eq!(watch.next_command_offset(), Some(11));

        watch.advance_command_cursor(5);
        assert_eq!(watch.last_seen_command(), Some(10));

        watch.advance_command_cursor(0);
        assert_eq!(watch.last_seen_command(), Some(10));
    }

    #[test]
    fn test_concurrent_mutation_and_reads() {
        let watch = WatchConfig::shared(WatchDefaults::default());
        let coins: Vec<Coin> = (0..16).map(|i| coin(&format!("C{}", i))).collect();

        let writer = {
            let watch = Arc::clone(&watch);
            let coins = coins.clone();
            std::thread::spawn(move || {
                for round in 0..500 {
                    for c in &coins {
                        match round % 3 {
                            0 => watch.enter(c.clone()),
                            1 => watch.untrack(c),
                            _ => {
                                watch.track(c.clone());
                            }
                        }
                    }
                    if round % 50 == 0 {
                        watch.reset();
                    }
                    watch.set_thresholds(Thresholds {
                        open: round as f64,
                        close: -(round as f64),
                    });
                }
            })
        };

        let reader = {
            let watch = Arc::clone(&watch);
            let coins = coins.clone();
            std::thread::spawn(move || {
                let mut observed = 0usize;
                for _ in 0..500 {
                    for c in &coins {
                        if watch.is_tracked(c) || watch.is_entered(c) {
                            observed += 1;
                        }
                    }
                    let _ = watch.tracked_coins();
                    let _ = watch.thresholds();
                }
                observed
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();

        assert!(subset_holds(&watch));
    }
}
