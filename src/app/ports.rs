//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ TelemetryService (domain)
//! ```
//!
//! Driven adapters (CO2 sensors, RTC, system clock, event sinks) implement
//! these traits.  The [`TelemetryService`](super::service::TelemetryService)
//! consumes them via generics, so the domain core never touches hardware
//! directly and runs against fakes on the host.

use log::debug;

use crate::clock::calendar::CalendarTime;
use crate::error::ClockError;

/// Attempts made by [`HardwareClockPort::read_if_plausible`].
pub const RTC_READ_ATTEMPTS: u32 = 3;
/// Spacing before each RTC read; helps when an SCD41 shares the bus.
pub const RTC_PRE_READ_PAUSE_MS: u32 = 2;
/// Extra back-off after a rejected RTC read.
pub const RTC_RETRY_PAUSE_MS: u32 = 8;

// ───────────────────────────────────────────────────────────────
// Gas sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One physical CO2 sensor.
pub trait GasSensorPort {
    /// Whether the sensor answered at boot.
    fn present(&mut self) -> bool;

    /// A fresh concentration (ppm) if one is ready, `None` otherwise.
    /// Bus errors and "not ready yet" both map to `None`.
    fn poll(&mut self) -> Option<f32>;

    /// Stop / re-initialise / restart the acquisition cycle.
    /// Best-effort; bounded by short fixed settling delays.
    fn recover_cycle(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Hardware clock port (driven adapter: RTC → domain)
// ───────────────────────────────────────────────────────────────

/// Battery-backed real-time clock.
pub trait HardwareClockPort {
    /// Single raw read of the clock registers.
    fn read_calendar(&mut self) -> Result<CalendarTime, ClockError>;

    /// Blocking pause used between read attempts.
    fn pause_ms(&mut self, ms: u32);

    /// Read with bounded retries, accepting only years in
    /// `[min_year, max_year]`.  Spends at most ~30 ms.
    fn read_if_plausible(&mut self, min_year: u16, max_year: u16) -> Option<CalendarTime> {
        for attempt in 1..=RTC_READ_ATTEMPTS {
            self.pause_ms(RTC_PRE_READ_PAUSE_MS);
            match self.read_calendar() {
                Ok(cal) if cal.is_plausible(min_year, max_year) => return Some(cal),
                Ok(cal) => debug!(
                    "RTC: attempt {attempt} rejected: {}",
                    ClockError::Implausible(cal.year)
                ),
                Err(e) => debug!("RTC: attempt {attempt} failed: {e}"),
            }
            self.pause_ms(RTC_RETRY_PAUSE_MS);
        }
        None
    }
}

// ───────────────────────────────────────────────────────────────
// System clock port (driven adapter: libc time ↔ domain)
// ───────────────────────────────────────────────────────────────

/// The primary software wall clock.
pub trait SystemClockPort {
    /// Seconds since the unix epoch.  Zero or negative means "never set".
    fn now_seconds(&self) -> i64;

    /// Set the clock from local wall time at the given UTC offset.
    fn set_from_calendar(
        &mut self,
        local: &CalendarTime,
        utc_offset_secs: i32,
    ) -> Result<(), ClockError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
