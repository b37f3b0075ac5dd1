//! Per-sensor read / validate / recover state machine.
//!
//! ```text
//!             success                       > stale_after_ms without success
//!   ┌──────────────────────┐        ┌──────────────────────────────────────┐
//!   ▼                      │        │                                      ▼
//! Nominal ──(no data)──▶ Nominal ───┘                                    Stale
//!   ▲                                                                      │
//!   │ success                                      recover_cycle() +       │
//!   └──────────────── Recovering ◀──────── last_good_ms = now ◀────────────┘
//! ```
//!
//! `Inactive` channels (sensor absent at boot) never leave that state.

use log::{info, warn};

use crate::app::ports::GasSensorPort;

/// Which physical sensor a channel wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelId {
    /// Room air upstream of the capture unit (I2C bus 1).
    Ambient,
    /// Air after the capture unit (I2C bus 2).
    Filtered,
}

impl ChannelId {
    /// Short log tag.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Ambient => "AMB",
            Self::Filtered => "FIL",
        }
    }
}

/// Boot-time detection result; permanent for the channel's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Active,
    Inactive,
}

/// Read health within an `Active` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Nominal,
    Stale,
    Recovering,
}

impl Health {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nominal => "nominal",
            Self::Stale => "stale",
            Self::Recovering => "recovering",
        }
    }
}

/// Last good value from a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// CO2 concentration (ppm).
    pub value: f32,
    /// Wall-clock epoch at which the value was read (0 if unknown).
    pub valid_at_epoch: u32,
    /// Monotonic tick (ms) at which the value was read.
    pub observed_at_ms: u64,
}

/// What a single `poll` did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// A new value arrived this tick.
    Fresh(f32),
    /// Nothing new; still within the staleness window.
    NoData,
    /// Staleness window exceeded; the acquisition cycle was restarted.
    Recovered,
    /// Sensor was absent at boot.
    Inactive,
}

/// Copyable view of a channel for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    pub present: bool,
    pub health: Health,
    pub recoveries: u32,
}

impl Default for ChannelStatus {
    fn default() -> Self {
        Self {
            present: false,
            health: Health::Nominal,
            recoveries: 0,
        }
    }
}

pub struct SensorChannel {
    id: ChannelId,
    presence: Presence,
    health: Health,
    last_good_ms: u64,
    stale_after_ms: u64,
    reading: Option<SensorReading>,
    recoveries: u32,
}

impl SensorChannel {
    /// Build a channel with a known presence.  `now_ms` seeds the staleness
    /// clock so a freshly booted sensor gets a full window.
    pub fn new(id: ChannelId, present: bool, stale_after_ms: u64, now_ms: u64) -> Self {
        Self {
            id,
            presence: if present {
                Presence::Active
            } else {
                Presence::Inactive
            },
            health: Health::Nominal,
            last_good_ms: now_ms,
            stale_after_ms,
            reading: None,
            recoveries: 0,
        }
    }

    /// Probe the sensor once and build the channel from the answer.
    pub fn detect(
        id: ChannelId,
        sensor: &mut impl GasSensorPort,
        stale_after_ms: u64,
        now_ms: u64,
    ) -> Self {
        let present = sensor.present();
        if present {
            info!("{}: sensor detected", id.tag());
        } else {
            warn!("{}: sensor not detected, channel inactive", id.tag());
        }
        Self::new(id, present, stale_after_ms, now_ms)
    }

    /// Attempt one read.  `epoch` is only evaluated on success.
    pub fn poll(
        &mut self,
        sensor: &mut impl GasSensorPort,
        now_ms: u64,
        epoch: impl FnOnce() -> u32,
    ) -> PollOutcome {
        if self.presence == Presence::Inactive {
            return PollOutcome::Inactive;
        }

        if let Some(value) = sensor.poll() {
            if self.health == Health::Recovering {
                info!("{}: data restored after recovery", self.id.tag());
            }
            self.reading = Some(SensorReading {
                value,
                valid_at_epoch: epoch(),
                observed_at_ms: now_ms,
            });
            self.last_good_ms = now_ms;
            self.health = Health::Nominal;
            return PollOutcome::Fresh(value);
        }

        if self.is_stale(now_ms) {
            self.health = Health::Stale;
            warn!(
                "{}: >{} ms no data, re-initialising",
                self.id.tag(),
                self.stale_after_ms
            );
            self.recover(sensor, now_ms);
            return PollOutcome::Recovered;
        }

        PollOutcome::NoData
    }

    /// Restart the sensor's acquisition cycle.  Only legal from `Stale`.
    fn recover(&mut self, sensor: &mut impl GasSensorPort, now_ms: u64) {
        debug_assert_eq!(self.health, Health::Stale);
        sensor.recover_cycle();
        self.recoveries = self.recoveries.saturating_add(1);
        // Rate-limit: the next attempt needs another full window.
        self.last_good_ms = now_ms;
        self.health = Health::Recovering;
    }

    fn is_stale(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_good_ms) > self.stale_after_ms
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn is_present(&self) -> bool {
        self.presence == Presence::Active
    }

    /// True once the channel has ever produced a reading.
    pub fn is_valid(&self) -> bool {
        self.reading.is_some()
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn reading(&self) -> Option<SensorReading> {
        self.reading
    }

    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    pub fn status(&self) -> ChannelStatus {
        ChannelStatus {
            present: self.is_present(),
            health: self.health,
            recoveries: self.recoveries,
        }
    }
}
