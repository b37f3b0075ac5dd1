//! DAC CO2 monitor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by the `espidf`
//! feature within each module.

#![deny(unused_must_use)]

pub mod api;
pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod telemetry;

pub mod adapters;
pub mod drivers;
pub mod pins;
pub mod sensors;
