#![forbid(unsafe_code)]

//! Heat tracking: a decaying integer score per panel type that decides
//! cache retention for `Hot`-mode panels.
//!
//! Activity adds heat (a full open adds more than a cache-hit query);
//! a fixed-period tick subtracts a configured decay from every tracked
//! key. The tracker is pure bookkeeping: it never destroys anything
//! itself, it only reports which keys cooled to zero on a tick so the
//! owner can decide.
//!
//! # Invariants
//!
//! 1. [`HeatTracker::heat`] never mutates — only explicit activity
//!    registration and [`HeatTracker::tick`] change scores.
//! 2. Heat is clamped to `[0, ceiling]`; an unknown key reads zero.
//! 3. A key is reported by `tick` at most once per zero crossing: only
//!    the tick that moves it from positive to zero includes it.
//!
//! # Failure Modes
//!
//! None. Unknown keys read zero heat and registering activity for a new
//! key starts tracking it.

use ahash::AHashMap;

use crate::types::PanelKey;

/// Tunable weights for the heat tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatConfig {
    /// Heat added when a panel is opened or created.
    pub open_weight: u32,
    /// Heat added when a lookup finds an existing instance.
    pub query_weight: u32,
    /// Heat subtracted from every tracked key per tick.
    pub decay_per_tick: u32,
    /// Upper bound on any key's heat.
    pub ceiling: u32,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            open_weight: 3,
            query_weight: 2,
            decay_per_tick: 1,
            ceiling: 255,
        }
    }
}

impl HeatConfig {
    /// Set the opened/created weight.
    #[must_use]
    pub fn open_weight(mut self, weight: u32) -> Self {
        self.open_weight = weight;
        self
    }

    /// Set the cache-hit query weight.
    #[must_use]
    pub fn query_weight(mut self, weight: u32) -> Self {
        self.query_weight = weight;
        self
    }

    /// Set the per-tick decay amount.
    #[must_use]
    pub fn decay_per_tick(mut self, decay: u32) -> Self {
        self.decay_per_tick = decay;
        self
    }

    /// Set the heat ceiling.
    #[must_use]
    pub fn ceiling(mut self, ceiling: u32) -> Self {
        self.ceiling = ceiling;
        self
    }
}

/// Aggregate counters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeatStats {
    /// Keys currently tracked.
    pub tracked: usize,
    /// Sum of all tracked heat.
    pub total_heat: u64,
    /// Decay ticks applied since construction.
    pub ticks: u64,
}

/// Per-panel-type heat scores with scheduled decay.
#[derive(Debug, Default)]
pub struct HeatTracker {
    heat: AHashMap<PanelKey, u32>,
    config: HeatConfig,
    ticks: u64,
}

impl HeatTracker {
    /// Create a tracker with the given weights.
    #[must_use]
    pub fn new(config: HeatConfig) -> Self {
        Self {
            heat: AHashMap::new(),
            config,
            ticks: 0,
        }
    }

    /// Current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> HeatConfig {
        self.config
    }

    /// Replace the configuration. Existing scores are clamped to the new
    /// ceiling.
    pub fn set_config(&mut self, config: HeatConfig) {
        self.config = config;
        for value in self.heat.values_mut() {
            *value = (*value).min(config.ceiling);
        }
    }

    /// Register a full open/create for `key`.
    pub fn register_open(&mut self, key: &PanelKey) {
        self.register_activity(key, self.config.open_weight);
    }

    /// Register a lookup that found an existing instance of `key`.
    pub fn register_query(&mut self, key: &PanelKey) {
        self.register_activity(key, self.config.query_weight);
    }

    /// Add `amount` heat to `key`, clamped to the ceiling. Starts
    /// tracking the key if it was unknown.
    pub fn register_activity(&mut self, key: &PanelKey, amount: u32) {
        let ceiling = self.config.ceiling;
        let entry = self.heat.entry(key.clone()).or_insert(0);
        *entry = entry.saturating_add(amount).min(ceiling);
    }

    /// Current heat for `key`. Unknown keys read zero. Pure: never
    /// changes any score.
    #[must_use]
    pub fn heat(&self, key: &PanelKey) -> u32 {
        self.heat.get(key).copied().unwrap_or(0)
    }

    /// Whether `key` is being tracked (even at zero heat).
    #[must_use]
    pub fn is_tracked(&self, key: &PanelKey) -> bool {
        self.heat.contains_key(key)
    }

    /// Apply one decay step to every tracked key.
    ///
    /// Returns the keys that crossed from positive heat to zero on this
    /// tick. Keys already at zero are not re-reported.
    pub fn tick(&mut self) -> Vec<PanelKey> {
        self.ticks += 1;
        let decay = self.config.decay_per_tick;
        if decay == 0 {
            return Vec::new();
        }
        let mut cooled = Vec::new();
        for (key, value) in &mut self.heat {
            if *value == 0 {
                continue;
            }
            *value = value.saturating_sub(decay);
            if *value == 0 {
                cooled.push(key.clone());
            }
        }
        cooled
    }

    /// Stop tracking `key`.
    pub fn remove(&mut self, key: &PanelKey) {
        self.heat.remove(key);
    }

    /// Aggregate counters.
    #[must_use]
    pub fn stats(&self) -> HeatStats {
        HeatStats {
            tracked: self.heat.len(),
            total_heat: self.heat.values().map(|v| u64::from(*v)).sum(),
            ticks: self.ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(name: &str) -> PanelKey {
        PanelKey::new(name)
    }

    #[test]
    fn unknown_key_reads_zero() {
        let tracker = HeatTracker::new(HeatConfig::default());
        assert_eq!(tracker.heat(&key("ghost")), 0);
        assert!(!tracker.is_tracked(&key("ghost")));
    }

    #[test]
    fn open_and_query_use_configured_weights() {
        let mut tracker = HeatTracker::new(
            HeatConfig::default().open_weight(3).query_weight(2),
        );
        tracker.register_open(&key("shop"));
        assert_eq!(tracker.heat(&key("shop")), 3);
        tracker.register_query(&key("shop"));
        assert_eq!(tracker.heat(&key("shop")), 5);
    }

    #[test]
    fn query_is_pure() {
        let mut tracker = HeatTracker::new(HeatConfig::default());
        tracker.register_open(&key("shop"));
        let before = tracker.heat(&key("shop"));
        for _ in 0..100 {
            let _ = tracker.heat(&key("shop"));
        }
        assert_eq!(tracker.heat(&key("shop")), before);
    }

    #[test]
    fn heat_clamps_to_ceiling() {
        let mut tracker = HeatTracker::new(HeatConfig::default().ceiling(10));
        for _ in 0..20 {
            tracker.register_open(&key("shop"));
        }
        assert_eq!(tracker.heat(&key("shop")), 10);
    }

    #[test]
    fn tick_decays_and_clamps_at_zero() {
        let mut tracker = HeatTracker::new(
            HeatConfig::default().open_weight(3).decay_per_tick(2),
        );
        tracker.register_open(&key("shop"));
        tracker.tick();
        assert_eq!(tracker.heat(&key("shop")), 1);
        tracker.tick();
        assert_eq!(tracker.heat(&key("shop")), 0);
        tracker.tick();
        assert_eq!(tracker.heat(&key("shop")), 0);
    }

    #[test]
    fn tick_reports_zero_crossing_exactly_once() {
        let mut tracker = HeatTracker::new(
            HeatConfig::default().open_weight(2).decay_per_tick(1),
        );
        tracker.register_open(&key("shop"));
        assert!(tracker.tick().is_empty());
        assert_eq!(tracker.tick(), vec![key("shop")]);
        assert!(tracker.tick().is_empty());
    }

    #[test]
    fn cooled_key_stays_tracked_until_removed() {
        let mut tracker = HeatTracker::new(
            HeatConfig::default().open_weight(1).decay_per_tick(1),
        );
        tracker.register_open(&key("shop"));
        tracker.tick();
        assert!(tracker.is_tracked(&key("shop")));
        tracker.remove(&key("shop"));
        assert!(!tracker.is_tracked(&key("shop")));
    }

    #[test]
    fn zero_decay_is_a_noop() {
        let mut tracker = HeatTracker::new(HeatConfig::default().decay_per_tick(0));
        tracker.register_open(&key("shop"));
        let before = tracker.heat(&key("shop"));
        assert!(tracker.tick().is_empty());
        assert_eq!(tracker.heat(&key("shop")), before);
    }

    #[test]
    fn set_config_reclamps_existing_scores() {
        let mut tracker = HeatTracker::new(HeatConfig::default());
        tracker.register_activity(&key("shop"), 200);
        tracker.set_config(HeatConfig::default().ceiling(50));
        assert_eq!(tracker.heat(&key("shop")), 50);
    }

    #[test]
    fn stats_aggregate() {
        let mut tracker = HeatTracker::new(HeatConfig::default());
        tracker.register_open(&key("a"));
        tracker.register_open(&key("b"));
        tracker.tick();
        let stats = tracker.stats();
        assert_eq!(stats.tracked, 2);
        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.total_heat, 4); // (3-1) * 2
    }

    #[test]
    fn example_scenario_query_extends_lifetime() {
        // open at t=0 with open=3, query=2, decay=1/tick.
        let mut tracker = HeatTracker::new(HeatConfig::default());
        tracker.register_open(&key("a"));
        tracker.tick(); // t=1s: heat 2
        tracker.register_query(&key("a")); // heat 4
        tracker.tick(); // t=2s: heat 3
        tracker.tick(); // t=3s: heat 2
        assert_eq!(tracker.heat(&key("a")), 2);
    }

    proptest! {
        #[test]
        fn heat_after_k_ticks_is_max_zero(
            open_weight in 0u32..100,
            decay in 1u32..10,
            ticks in 0usize..64,
        ) {
            let mut tracker = HeatTracker::new(
                HeatConfig::default()
                    .open_weight(open_weight)
                    .decay_per_tick(decay)
                    .ceiling(u32::MAX),
            );
            tracker.register_open(&key("p"));
            for _ in 0..ticks {
                // Interleaved pure queries must not perturb the arithmetic.
                let _ = tracker.heat(&key("p"));
                tracker.tick();
            }
            let expected = open_weight.saturating_sub(decay.saturating_mul(ticks as u32));
            prop_assert_eq!(tracker.heat(&key("p")), expected);
        }
    }
}
