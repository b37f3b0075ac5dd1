//! Board wiring for the DAC monitor (ESP32-WROOM devkit).
//!
//! Single source of truth for pin numbers, bus speeds and the access-point
//! identity.  `main` picks the matching typed GPIOs from `Peripherals`; the
//! numbers here feed log and scan labels.

// ---------------------------------------------------------------------------
// I2C bus 1: ambient SCD41 + DS3231 RTC
// ---------------------------------------------------------------------------

pub const I2C1_SDA_GPIO: i32 = 21;
pub const I2C1_SCL_GPIO: i32 = 22;
/// Slow bus: two devices and longer wiring.
pub const I2C1_BAUD_HZ: u32 = 50_000;

// ---------------------------------------------------------------------------
// I2C bus 2: filtered SCD41
// ---------------------------------------------------------------------------

pub const I2C2_SDA_GPIO: i32 = 18;
pub const I2C2_SCL_GPIO: i32 = 19;
pub const I2C2_BAUD_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Access point
// ---------------------------------------------------------------------------

pub const AP_SSID: &str = "DAC CO2 MONITORING";
pub const AP_PASSWORD: &str = "direct_air_capture_2025";

/// `"Bus1 (21/22)"` style label for scan output.
pub fn bus_label(bus: u8, sda: i32, scl: i32) -> String {
    format!("Bus{bus} ({sda}/{scl})")
}
