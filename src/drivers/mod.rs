//! I2C peripheral drivers and bus diagnostics.

pub mod ds3231;
pub mod i2c_scan;
