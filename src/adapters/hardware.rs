//! Hardware adapter bridging the I2C drivers to the domain port traits.
//!
//! [`Scd4xSensor`] implements [`GasSensorPort`], [`Ds3231Clock`] implements
//! [`HardwareClockPort`].  Both are generic over `embedded-hal` so the same
//! code runs against `I2cDriver` on the board and against mocks on the host.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::app::ports::{GasSensorPort, HardwareClockPort};
use crate::clock::calendar::CalendarTime;
use crate::drivers::ds3231::Ds3231;
use crate::error::ClockError;
use crate::sensors::channel::ChannelId;
use crate::sensors::scd4x::Scd4x;

/// Let the DS3231 commit freshly written time registers.
const RTC_COMMIT_WAIT_MS: u32 = 10;

// ── SCD4x ─────────────────────────────────────────────────────

pub struct Scd4xSensor<I2C, D> {
    driver: Scd4x<I2C, D>,
    id: ChannelId,
    detected: bool,
}

impl<I2C: I2c, D: DelayNs + Clone> Scd4xSensor<I2C, D> {
    /// Probe the sensor and, if it answers, start periodic measurement
    /// followed by one full re-init cycle.
    pub fn begin(mut driver: Scd4x<I2C, D>, id: ChannelId) -> Self {
        let detected = match driver.probe() {
            Ok(serial) => {
                info!("{}: SCD4x serial {:012X}", id.tag(), serial);
                true
            }
            Err(e) => {
                warn!("{}: SCD4x not detected: {}", id.tag(), e);
                false
            }
        };

        let mut sensor = Self {
            driver,
            id,
            detected,
        };
        if detected {
            if let Err(e) = sensor.driver.start_periodic_measurement() {
                warn!("{}: start failed: {}", id.tag(), e);
            }
            sensor.recover_cycle();
        }
        sensor
    }
}

impl<I2C: I2c, D: DelayNs + Clone> GasSensorPort for Scd4xSensor<I2C, D> {
    fn present(&mut self) -> bool {
        self.detected
    }

    fn poll(&mut self) -> Option<f32> {
        match self.driver.try_read() {
            Ok(Some(m)) => Some(f32::from(m.co2_ppm)),
            Ok(None) => None,
            Err(e) => {
                debug!("{}: read failed: {}", self.id.tag(), e);
                None
            }
        }
    }

    fn recover_cycle(&mut self) {
        match self.driver.kick() {
            Ok(()) => info!("{}: SCD4x reInit+start", self.id.tag()),
            Err(e) => warn!("{}: SCD4x re-init failed: {}", self.id.tag(), e),
        }
    }
}

// ── DS3231 ────────────────────────────────────────────────────

pub struct Ds3231Clock<I2C, D> {
    driver: Ds3231<I2C>,
    delay: D,
}

impl<I2C: I2c, D: DelayNs> Ds3231Clock<I2C, D> {
    /// `None` when nothing answers at the RTC address.
    pub fn detect(mut driver: Ds3231<I2C>, delay: D) -> Option<Self> {
        if driver.probe() {
            info!("RTC: DS3231 detected");
            Some(Self { driver, delay })
        } else {
            warn!("RTC: DS3231 not found");
            None
        }
    }

    /// Boot-time housekeeping: silence the unused outputs, and if the
    /// oscillator stopped, load `seed` (local time) into the chip.
    /// Returns whether the chip was re-seeded.
    pub fn housekeep(&mut self, seed: Option<&CalendarTime>) -> Result<bool, ClockError> {
        if let Err(e) = self.driver.quiet_outputs() {
            warn!("RTC: could not disable 32K/SQW: {}", ClockError::from(e));
        }
        if !self.driver.lost_power()? {
            return Ok(false);
        }
        let Some(seed) = seed else {
            warn!("RTC: lost power and no seed time available");
            return Ok(false);
        };
        info!("RTC: lost power, init to build time {}", seed.timestamp_text());
        self.driver.set_calendar(seed)?;
        self.delay.delay_ms(RTC_COMMIT_WAIT_MS);
        Ok(true)
    }
}

impl<I2C: I2c, D: DelayNs> HardwareClockPort for Ds3231Clock<I2C, D> {
    fn read_calendar(&mut self) -> Result<CalendarTime, ClockError> {
        Ok(self.driver.read_calendar()?)
    }

    fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
