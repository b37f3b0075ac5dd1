//! Unified error types for the DAC monitor firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! boot path and adapters uniform.  All variants are `Copy` so they can be
//! passed through the polling loop and logged without allocation.
//!
//! Note that the polling loop itself never propagates these: sensor and clock
//! failures degrade to "skip this tick" inside the core.  The types exist for
//! driver/adapter boundaries and configuration validation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A CO2 sensor could not be read or returned corrupt data.
    Sensor(SensorError),
    /// A wall-clock source is unavailable or returned an implausible time.
    Clock(ClockError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Clock(e) => write!(f, "clock: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transfer failed or the sensor did not acknowledge.
    BusFailed,
    /// A received word failed its CRC-8 check.
    CrcMismatch,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFailed => write!(f, "I2C transfer failed"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Clock errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// No clock is present or it did not respond.
    Unavailable,
    /// The clock answered with a year outside the accepted window.
    Implausible(u16),
    /// Register contents do not form a valid calendar date.
    InvalidCalendar,
    /// Writing the clock failed.
    SetFailed,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "unavailable"),
            Self::Implausible(year) => write!(f, "implausible year {year}"),
            Self::InvalidCalendar => write!(f, "invalid calendar fields"),
            Self::SetFailed => write!(f, "set failed"),
        }
    }
}

impl From<ClockError> for Error {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
