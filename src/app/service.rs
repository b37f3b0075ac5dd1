//! Application service, the hexagonal core.
//!
//! [`TelemetryService`] owns the time source, both sensor channels and the
//! improvement model.  Each call to [`tick`](TelemetryService::tick) polls
//! the sensors it is handed, and logs at most one entry into the shared
//! telemetry state.
//!
//! ```text
//!  GasSensorPort ×2 ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                       │    TelemetryService      │
//!  SystemClockPort  ──▶ │ channels · clock · model │ ──▶ SharedTelemetry
//!  HardwareClockPort──▶ └──────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::clock::TimeSource;
use crate::config::SystemConfig;
use crate::sensors::channel::{ChannelStatus, Health, PollOutcome, SensorChannel};
use crate::telemetry::improvement::ImprovementModel;
use crate::telemetry::log_store::{AppendOutcome, LogEntry};
use crate::telemetry::{self, SharedTelemetry};

use super::events::AppEvent;
use super::ports::{EventSink, GasSensorPort, HardwareClockPort, SystemClockPort};

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// An entry with this epoch was appended.
    Logged(u32),
    /// Neither sensor produced a new value.
    NoNewData,
    /// At least one channel has never produced a reading.
    AwaitingBothChannels,
    /// Wall time is unknown (epoch 0).
    UnknownTime,
    /// Still inside the second of the previous entry.
    SameSecond,
}

/// Running counters, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub ticks: u64,
    pub logged: u64,
    /// Logged entries the positivity policy altered.
    pub adjusted: u64,
    pub skipped_unknown_time: u64,
    pub evictions: u64,
}

pub struct TelemetryService<S, R> {
    clock: TimeSource<S, R>,
    ambient: SensorChannel,
    filtered: SensorChannel,
    model: ImprovementModel,
    shared: SharedTelemetry,
    stats: ServiceStats,
    published: (ChannelStatus, ChannelStatus),
}

impl<S: SystemClockPort, R: HardwareClockPort> TelemetryService<S, R> {
    pub fn new(
        config: &SystemConfig,
        clock: TimeSource<S, R>,
        ambient: SensorChannel,
        filtered: SensorChannel,
        shared: SharedTelemetry,
    ) -> Self {
        Self {
            clock,
            ambient,
            filtered,
            model: ImprovementModel::from_config(config),
            shared,
            stats: ServiceStats::default(),
            published: (ChannelStatus::default(), ChannelStatus::default()),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Prime the clock and publish boot-time presence.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        let has_rtc = self.clock.has_rtc();
        sink.emit(&AppEvent::Started {
            ambient: self.ambient.is_present(),
            filtered: self.filtered.is_present(),
            rtc: has_rtc,
        });

        if has_rtc {
            match self.clock.prime() {
                Ok(epoch) => sink.emit(&AppEvent::ClockPrimed { epoch }),
                Err(e) => sink.emit(&AppEvent::ClockPrimeFailed(e)),
            }
        } else {
            warn!("TIME: no RTC, wall time unknown until the system clock is set");
        }

        telemetry::write(&self.shared, |s| s.has_rtc = has_rtc);
        self.publish_status();
        info!(
            "TelemetryService started (amb={}, fil={}, rtc={})",
            self.ambient.is_present(),
            self.filtered.is_present(),
            has_rtc
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one polling cycle: read both sensors, recover stale ones, and
    /// log an entry when a fresh value arrived and both channels are valid.
    pub fn tick(
        &mut self,
        now_ms: u64,
        ambient: &mut impl GasSensorPort,
        filtered: &mut impl GasSensorPort,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        self.stats.ticks += 1;

        let amb = poll_channel(&mut self.ambient, ambient, now_ms, &mut self.clock, sink);
        let fil = poll_channel(&mut self.filtered, filtered, now_ms, &mut self.clock, sink);
        self.publish_status();

        let fresh = matches!(amb, PollOutcome::Fresh(_)) || matches!(fil, PollOutcome::Fresh(_));
        if !fresh {
            return TickOutcome::NoNewData;
        }

        let (Some(a), Some(f)) = (self.ambient.reading(), self.filtered.reading()) else {
            return TickOutcome::AwaitingBothChannels;
        };

        let wall = self.clock.now();
        if !wall.is_known() {
            self.stats.skipped_unknown_time += 1;
            return TickOutcome::UnknownTime;
        }

        let improvement = self.model.apply(a.value, f.value);
        let entry = LogEntry {
            epoch: wall.epoch,
            timestamp: wall.timestamp,
            ambient: improvement.ambient,
            filtered: improvement.filtered,
            improvement_pct: improvement.improvement_pct,
            adjusted: improvement.adjusted,
        };

        match telemetry::write(&self.shared, |s| s.log.append(entry)) {
            AppendOutcome::RejectedUnknownTime => {
                self.stats.skipped_unknown_time += 1;
                TickOutcome::UnknownTime
            }
            AppendOutcome::RejectedDuplicate => TickOutcome::SameSecond,
            outcome => {
                self.stats.logged += 1;
                if improvement.adjusted {
                    self.stats.adjusted += 1;
                }
                sink.emit(&AppEvent::EntryLogged {
                    epoch: wall.epoch,
                    improvement_pct: improvement.improvement_pct,
                    adjusted: improvement.adjusted,
                });
                if let AppendOutcome::AppendedAndEvicted(dropped) = outcome {
                    self.stats.evictions += 1;
                    sink.emit(&AppEvent::LogEvicted { dropped });
                }
                TickOutcome::Logged(wall.epoch)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    pub fn ambient(&self) -> &SensorChannel {
        &self.ambient
    }

    pub fn filtered(&self) -> &SensorChannel {
        &self.filtered
    }

    pub fn clock_mut(&mut self) -> &mut TimeSource<S, R> {
        &mut self.clock
    }

    pub fn shared(&self) -> &SharedTelemetry {
        &self.shared
    }

    // ── Internal ──────────────────────────────────────────────

    /// Copy channel status into the shared state, only when it changed.
    fn publish_status(&mut self) {
        let current = (self.ambient.status(), self.filtered.status());
        if current == self.published {
            return;
        }
        telemetry::write(&self.shared, |s| {
            s.ambient = current.0;
            s.filtered = current.1;
        });
        self.published = current;
    }
}

fn poll_channel<S: SystemClockPort, R: HardwareClockPort>(
    channel: &mut SensorChannel,
    sensor: &mut impl GasSensorPort,
    now_ms: u64,
    clock: &mut TimeSource<S, R>,
    sink: &mut impl EventSink,
) -> PollOutcome {
    let before = channel.health();
    let outcome = channel.poll(sensor, now_ms, || clock.now_epoch());
    match outcome {
        PollOutcome::Recovered => sink.emit(&AppEvent::ChannelRecovery {
            channel: channel.id(),
            attempt: channel.recoveries(),
        }),
        PollOutcome::Fresh(value) if before == Health::Recovering => {
            debug!("{}: restored at {:.1} ppm", channel.id().tag(), value);
            sink.emit(&AppEvent::ChannelRestored(channel.id()));
        }
        _ => {}
    }
    outcome
}
