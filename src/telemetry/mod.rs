//! Retained telemetry and the state shared between the polling loop and
//! the query handlers.
//!
//! ```text
//!   polling loop ──append──▶ SharedTelemetry ◀──copy-out── HTTP handlers
//!                            (one blocking mutex)
//! ```
//!
//! Readers copy bounded results out under the lock and serialise after
//! releasing it, so the critical section never includes socket I/O.

pub mod buckets;
pub mod improvement;
pub mod log_store;

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::config::SystemConfig;
use crate::sensors::channel::ChannelStatus;
use log_store::LogStore;

/// Everything a query can see.
pub struct TelemetryState {
    pub log: LogStore,
    pub ambient: ChannelStatus,
    pub filtered: ChannelStatus,
    pub has_rtc: bool,
}

impl TelemetryState {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            log: LogStore::from_config(config),
            ambient: ChannelStatus::default(),
            filtered: ChannelStatus::default(),
            has_rtc: false,
        }
    }
}

pub type SharedTelemetry = Arc<Mutex<CriticalSectionRawMutex, RefCell<TelemetryState>>>;

pub fn shared(state: TelemetryState) -> SharedTelemetry {
    Arc::new(Mutex::new(RefCell::new(state)))
}

/// Run `f` with read access to the shared state.
pub fn read<R>(shared: &SharedTelemetry, f: impl FnOnce(&TelemetryState) -> R) -> R {
    shared.lock(|cell| f(&cell.borrow()))
}

/// Run `f` with write access to the shared state.
pub fn write<R>(shared: &SharedTelemetry, f: impl FnOnce(&mut TelemetryState) -> R) -> R {
    shared.lock(|cell| f(&mut cell.borrow_mut()))
}
