//! Sensirion SCD4x (SCD40/SCD41) photoacoustic CO2 sensor.
//!
//! The command set and CRC-checked word transfer come from the `scd4x`
//! crate.  This wrapper adds what the monitor layers on top: a presence
//! probe, a non-blocking read that returns `None` until a sample is
//! ready, and the stop / re-init / restart "kick" with its settle delays.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::SensorError;

/// Fixed 7-bit I2C address.
pub const SCD4X_ADDR: u8 = 0x62;

impl<E> From<scd4x::Error<E>> for SensorError {
    fn from(e: scd4x::Error<E>) -> Self {
        match e {
            scd4x::Error::Crc => SensorError::CrcMismatch,
            _ => SensorError::BusFailed,
        }
    }
}

/// One periodic measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub co2_ppm: u16,
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

pub struct Scd4x<I2C, D> {
    sensor: scd4x::Scd4x<I2C, D>,
    delay: D,
    stop_settle_ms: u32,
    reinit_settle_ms: u32,
}

impl<I2C: I2c, D: DelayNs + Clone> Scd4x<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            sensor: scd4x::Scd4x::new(i2c, delay.clone()),
            delay,
            stop_settle_ms: 50,
            reinit_settle_ms: 20,
        }
    }

    /// Override the settling delays used by [`kick`](Self::kick).
    pub fn with_settle(mut self, stop_settle_ms: u32, reinit_settle_ms: u32) -> Self {
        self.stop_settle_ms = stop_settle_ms;
        self.reinit_settle_ms = reinit_settle_ms;
        self
    }

    /// 48-bit factory serial number.  Only answered in idle mode.
    pub fn serial_number(&mut self) -> Result<u64, SensorError> {
        Ok(self.sensor.serial_number()?)
    }

    /// Presence probe: force idle mode, then read the serial number.
    /// Any answer with valid CRCs counts as present.
    pub fn probe(&mut self) -> Result<u64, SensorError> {
        // A sensor that is already idle may NACK the stop.
        let _ = self.sensor.stop_periodic_measurement();
        self.serial_number()
    }

    pub fn start_periodic_measurement(&mut self) -> Result<(), SensorError> {
        Ok(self.sensor.start_periodic_measurement()?)
    }

    /// `Ok(None)` when no new sample is ready yet.
    pub fn try_read(&mut self) -> Result<Option<Measurement>, SensorError> {
        if !self.sensor.data_ready_status()? {
            return Ok(None);
        }
        let data = self.sensor.measurement()?;
        Ok(Some(Measurement {
            co2_ppm: data.co2,
            temperature_c: data.temperature,
            humidity_pct: data.humidity,
        }))
    }

    /// Stop, re-init and restart periodic measurement, pausing for the
    /// two settle delays between the steps.
    pub fn kick(&mut self) -> Result<(), SensorError> {
        // Keep going on a failed stop: the sensor may already be idle.
        let stopped = self.sensor.stop_periodic_measurement();
        self.delay.delay_ms(self.stop_settle_ms);
        self.sensor.reinit()?;
        self.delay.delay_ms(self.reinit_settle_ms);
        self.sensor.start_periodic_measurement()?;
        Ok(stopped?)
    }
}
