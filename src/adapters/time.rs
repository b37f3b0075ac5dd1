//! ESP32 time adapters.
//!
//! - [`MonotonicClock`]: milliseconds since boot, drives staleness checks.
//! - [`SystemWallClock`]: the libc wall clock, implements [`SystemClockPort`].
//!
//! ## Dual-target design
//!
//! - **`espidf`**: `esp_timer_get_time()` for uptime, `gettimeofday` /
//!   `settimeofday` for wall time.
//! - **host**: `std::time::Instant` for uptime and a static `AtomicI64`
//!   standing in for the wall clock, settable from tests.

use crate::app::ports::SystemClockPort;
use crate::clock::calendar::CalendarTime;
use crate::error::ClockError;

/// Wall-clock readings before 2020-01-01 mean "never set": an unset
/// ESP32 clock counts up from the epoch at boot.
const EPOCH_2020: i64 = 1_577_836_800;

#[cfg(not(feature = "espidf"))]
static SIM_WALL_SECS: core::sync::atomic::AtomicI64 = core::sync::atomic::AtomicI64::new(0);

/// Set the simulated wall clock (host only).  0 means unset.
#[cfg(not(feature = "espidf"))]
pub fn sim_set_wall_clock(secs: i64) {
    SIM_WALL_SECS.store(secs, core::sync::atomic::Ordering::Relaxed);
}

// ───────────────────────────────────────────────────────────────
// Monotonic uptime
// ───────────────────────────────────────────────────────────────

pub struct MonotonicClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot.
    #[cfg(feature = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since construction.
    #[cfg(not(feature = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

// ───────────────────────────────────────────────────────────────
// System wall clock
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct SystemWallClock;

impl SystemWallClock {
    pub fn new() -> Self {
        Self
    }

    #[cfg(feature = "espidf")]
    fn raw_seconds(&self) -> i64 {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return 0;
        }
        i64::from(tv.tv_sec)
    }

    #[cfg(not(feature = "espidf"))]
    fn raw_seconds(&self) -> i64 {
        SIM_WALL_SECS.load(core::sync::atomic::Ordering::Relaxed)
    }

    #[cfg(feature = "espidf")]
    fn set_raw_seconds(&mut self, secs: i64) -> Result<(), ClockError> {
        let tv = esp_idf_svc::sys::timeval {
            tv_sec: secs as esp_idf_svc::sys::time_t,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::settimeofday(&tv, core::ptr::null()) } != 0 {
            return Err(ClockError::SetFailed);
        }
        Ok(())
    }

    #[cfg(not(feature = "espidf"))]
    fn set_raw_seconds(&mut self, secs: i64) -> Result<(), ClockError> {
        sim_set_wall_clock(secs);
        Ok(())
    }
}

impl SystemClockPort for SystemWallClock {
    fn now_seconds(&self) -> i64 {
        let secs = self.raw_seconds();
        if secs < EPOCH_2020 { 0 } else { secs }
    }

    fn set_from_calendar(
        &mut self,
        local: &CalendarTime,
        utc_offset_secs: i32,
    ) -> Result<(), ClockError> {
        let epoch = local
            .to_epoch(utc_offset_secs)
            .filter(|e| *e > 0)
            .ok_or(ClockError::InvalidCalendar)?;
        self.set_raw_seconds(epoch)
    }
}
