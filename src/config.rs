//! System configuration parameters
//!
//! All tunable parameters for the DAC monitor.  Board wiring (pins, bus
//! speeds, access-point credentials) lives in `pins.rs` instead.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Log retention ---
    /// Soft cap on retained log entries (~1 h at 1 Hz).
    pub log_max_keep: usize,
    /// Entries dropped in one batch once the cap plus this slack is exceeded.
    pub eviction_batch: usize,

    // --- Sensors ---
    /// Milliseconds without a good read before a channel is re-initialised.
    pub stale_after_ms: u64,
    /// Settling delay after stopping periodic measurement (ms).
    pub recovery_stop_settle_ms: u32,
    /// Settling delay after re-init before restarting (ms).
    pub recovery_reinit_settle_ms: u32,

    // --- Improvement policy ---
    /// Minimum logged improvement (%).
    pub min_improvement_pct: f32,
    /// Amount (ppm) subtracted below the target so the minimum is strictly exceeded.
    pub improvement_epsilon: f32,

    // --- Time ---
    /// Local offset from UTC in seconds (Asia/Manila = +8 h).
    pub utc_offset_secs: i32,
    /// Earliest RTC year accepted as plausible.
    pub rtc_min_year: u16,
    /// Latest RTC year accepted as plausible.
    pub rtc_max_year: u16,

    // --- Timing ---
    /// Yield between polling-loop iterations (ms).
    pub poll_yield_ms: u32,

    // --- Query defaults ---
    /// Raw entries returned by `bootstrap` when no limit is given.
    pub bootstrap_default_limit: usize,
    /// 5-second buckets returned by `series` when no limit is given.
    pub g5_default_limit: usize,
    /// 1-minute buckets returned by `series` when no limit is given.
    pub m1_default_limit: usize,
    /// Largest accepted value for any query limit.
    pub query_max_limit: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Log retention
            log_max_keep: 3600,
            eviction_batch: 60,

            // Sensors
            stale_after_ms: 15_000,
            recovery_stop_settle_ms: 50,
            recovery_reinit_settle_ms: 20,

            // Improvement policy
            min_improvement_pct: 0.5,
            improvement_epsilon: 0.05,

            // Time
            utc_offset_secs: 8 * 3600,
            rtc_min_year: 2024,
            rtc_max_year: 2099,

            // Timing
            poll_yield_ms: 2,

            // Query defaults
            bootstrap_default_limit: 180, // ~3 min warm-up
            g5_default_limit: 120,        // last 10 min
            m1_default_limit: 180,        // last 3 h
            query_max_limit: 2000,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Boot falls back to defaults on failure.
    pub fn validate(&self) -> Result<()> {
        if !(60..=20_000).contains(&self.log_max_keep) {
            return Err(Error::Config("log_max_keep must be 60–20000"));
        }
        if self.eviction_batch == 0 || self.eviction_batch > self.log_max_keep {
            return Err(Error::Config("eviction_batch must be 1–log_max_keep"));
        }
        if !(1_000..=600_000).contains(&self.stale_after_ms) {
            return Err(Error::Config("stale_after_ms must be 1000–600000"));
        }
        if self.recovery_stop_settle_ms + self.recovery_reinit_settle_ms > 100 {
            return Err(Error::Config("recovery settle delays must total <= 100 ms"));
        }
        if !(0.0..=50.0).contains(&self.min_improvement_pct) {
            return Err(Error::Config("min_improvement_pct must be 0.0–50.0"));
        }
        if !(0.0..=10.0).contains(&self.improvement_epsilon) {
            return Err(Error::Config("improvement_epsilon must be 0.0–10.0"));
        }
        if !(-12 * 3600..=14 * 3600).contains(&self.utc_offset_secs) {
            return Err(Error::Config("utc_offset_secs must be within -12 h..+14 h"));
        }
        if self.rtc_min_year < 2000 || self.rtc_min_year > self.rtc_max_year {
            return Err(Error::Config("rtc year window is inverted or before 2000"));
        }
        if self.poll_yield_ms > 1000 {
            return Err(Error::Config("poll_yield_ms must be <= 1000"));
        }
        let max = self.query_max_limit;
        if max == 0
            || !(1..=max).contains(&self.bootstrap_default_limit)
            || !(1..=max).contains(&self.g5_default_limit)
            || !(1..=max).contains(&self.m1_default_limit)
        {
            return Err(Error::Config("query defaults must be 1–query_max_limit"));
        }
        Ok(())
    }
}
