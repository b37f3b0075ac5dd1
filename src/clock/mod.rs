//! Dual-source wall-clock resolution.
//!
//! ```text
//!   SystemClockPort ──(epoch > 0)──▶ use it
//!          │ unset
//!          ▼
//!   HardwareClockPort ──(plausible)──▶ use RTC calendar
//!          │ absent / implausible
//!          ▼
//!   epoch 0 + "0000-00-00 00:00:00"
//! ```
//!
//! Every query is total: callers treat epoch 0 as "unknown time" and skip
//! logging for that tick.

pub mod calendar;

use log::{info, warn};

use crate::app::ports::{HardwareClockPort, SystemClockPort};
use crate::config::SystemConfig;
use crate::error::ClockError;
use calendar::{CalendarTime, TimestampText, sentinel_timestamp};

/// Epoch and its local text, resolved from a single clock read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallClock {
    pub epoch: u32,
    pub timestamp: TimestampText,
}

impl WallClock {
    /// The "no clock available" value.
    pub fn unknown() -> Self {
        Self {
            epoch: 0,
            timestamp: sentinel_timestamp(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.epoch != 0
    }
}

/// Firmware build time as local wall time, used to seed an RTC whose
/// oscillator stopped.  `None` if the build did not record a usable epoch.
pub fn build_time(utc_offset_secs: i32) -> Option<CalendarTime> {
    let epoch: i64 = option_env!("DACMON_BUILD_EPOCH")?.parse().ok()?;
    if epoch <= 0 {
        return None;
    }
    CalendarTime::from_epoch(epoch, utc_offset_secs)
}

/// Resolves wall time from the system clock with an optional RTC fallback.
pub struct TimeSource<S, R> {
    system: S,
    rtc: Option<R>,
    utc_offset_secs: i32,
    min_year: u16,
    max_year: u16,
}

impl<S: SystemClockPort, R: HardwareClockPort> TimeSource<S, R> {
    pub fn new(system: S, rtc: Option<R>, config: &SystemConfig) -> Self {
        Self {
            system,
            rtc,
            utc_offset_secs: config.utc_offset_secs,
            min_year: config.rtc_min_year,
            max_year: config.rtc_max_year,
        }
    }

    pub fn has_rtc(&self) -> bool {
        self.rtc.is_some()
    }

    /// Seed the system clock from the RTC.  Called once at boot; failures
    /// are logged and the node keeps running off the RTC fallback.
    pub fn prime(&mut self) -> Result<u32, ClockError> {
        let Some(rtc) = self.rtc.as_mut() else {
            return Err(ClockError::Unavailable);
        };
        let Some(cal) = rtc.read_if_plausible(self.min_year, self.max_year) else {
            warn!("TIME: RTC read failed, skip prime");
            return Err(ClockError::Unavailable);
        };
        let epoch = cal
            .to_epoch(self.utc_offset_secs)
            .and_then(|e| u32::try_from(e).ok())
            .filter(|e| *e > 0)
            .ok_or(ClockError::InvalidCalendar)?;
        self.system.set_from_calendar(&cal, self.utc_offset_secs)?;
        info!("TIME: primed from RTC: {}", cal.timestamp_text());
        Ok(epoch)
    }

    /// Current epoch and local text from one clock read.
    pub fn now(&mut self) -> WallClock {
        let secs = self.system.now_seconds();
        if secs > 0 {
            if let Some(wall) = self.resolve_system(secs) {
                return wall;
            }
        }
        self.resolve_rtc().unwrap_or_else(WallClock::unknown)
    }

    /// Current unix epoch, 0 if unknown.
    pub fn now_epoch(&mut self) -> u32 {
        self.now().epoch
    }

    /// Current local `"YYYY-MM-DD HH:MM:SS"`, sentinel if unknown.
    pub fn now_timestamp(&mut self) -> TimestampText {
        self.now().timestamp
    }

    /// Direct RTC access for boot-time housekeeping.
    pub fn rtc_mut(&mut self) -> Option<&mut R> {
        self.rtc.as_mut()
    }

    // ── Internal ──────────────────────────────────────────────

    fn resolve_system(&self, secs: i64) -> Option<WallClock> {
        let epoch = u32::try_from(secs).ok()?;
        let cal = CalendarTime::from_epoch(secs, self.utc_offset_secs)?;
        Some(WallClock {
            epoch,
            timestamp: cal.timestamp_text(),
        })
    }

    fn resolve_rtc(&mut self) -> Option<WallClock> {
        let rtc = self.rtc.as_mut()?;
        let cal = rtc.read_if_plausible(self.min_year, self.max_year)?;
        let epoch = u32::try_from(cal.to_epoch(self.utc_offset_secs)?).ok()?;
        Some(WallClock {
            epoch,
            timestamp: cal.timestamp_text(),
        })
    }
}
