//! Application core: pure domain logic, zero I/O.
//!
//! Sensor polling, recovery, clock resolution and logging policy for the
//! DAC monitor.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod events;
pub mod ports;
pub mod service;
