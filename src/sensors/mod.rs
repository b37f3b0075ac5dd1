//! CO2 sensor subsystem: the SCD4x bus driver and the per-sensor
//! [`SensorChannel`](channel::SensorChannel) state machine that wraps it.

pub mod channel;
pub mod scd4x;

pub use channel::{ChannelId, ChannelStatus, Health, PollOutcome, SensorChannel};
