//! Integration tests for the TelemetryService polling pipeline.
//!
//! Sensors, clocks and the event sink are port-level mocks; the log store
//! and shared state are the real ones, inspected after each tick.

use super::mock_hw::{MockGasSensor, MockRtc, MockSystemClock, RecordingSink};

use dacmon::app::events::AppEvent;
use dacmon::app::service::{TelemetryService, TickOutcome};
use dacmon::clock::TimeSource;
use dacmon::clock::calendar::CalendarTime;
use dacmon::config::SystemConfig;
use dacmon::error::ClockError;
use dacmon::sensors::channel::{ChannelId, Health, SensorChannel};
use dacmon::telemetry::{self, TelemetryState};

/// 2025-03-01 00:00:00 UTC, 08:00:00 in UTC+8.
const T0: i64 = 1_740_787_200;

type Service = TelemetryService<MockSystemClock, MockRtc>;

struct Rig {
    service: Service,
    clock: MockSystemClock,
    ambient: MockGasSensor,
    filtered: MockGasSensor,
    sink: RecordingSink,
}

impl Rig {
    fn tick(&mut self, now_ms: u64) -> TickOutcome {
        self.service
            .tick(now_ms, &mut self.ambient, &mut self.filtered, &mut self.sink)
    }

    fn log_len(&self) -> usize {
        telemetry::read(self.service.shared(), |s| s.log.len())
    }
}

fn make_rig_with(
    config: &SystemConfig,
    mut ambient: MockGasSensor,
    mut filtered: MockGasSensor,
    system_secs: i64,
    rtc: Option<MockRtc>,
) -> Rig {
    let clock = MockSystemClock::at(system_secs);
    let amb_ch = SensorChannel::detect(ChannelId::Ambient, &mut ambient, config.stale_after_ms, 0);
    let fil_ch =
        SensorChannel::detect(ChannelId::Filtered, &mut filtered, config.stale_after_ms, 0);
    let service = TelemetryService::new(
        config,
        TimeSource::new(clock.clone(), rtc, config),
        amb_ch,
        fil_ch,
        telemetry::shared(TelemetryState::new(config)),
    );
    Rig {
        service,
        clock,
        ambient,
        filtered,
        sink: RecordingSink::new(),
    }
}

fn make_rig(ambient: MockGasSensor, filtered: MockGasSensor) -> Rig {
    make_rig_with(&SystemConfig::default(), ambient, filtered, T0, None)
}

fn rtc_time() -> CalendarTime {
    CalendarTime {
        year: 2025,
        month: 3,
        day: 1,
        hour: 14,
        minute: 7,
        second: 59,
    }
}

// ── Happy path ────────────────────────────────────────────────

#[test]
fn logs_entry_when_both_channels_report() {
    let mut rig = make_rig(MockGasSensor::steady(800.0), MockGasSensor::steady(700.0));

    assert_eq!(rig.tick(0), TickOutcome::Logged(T0 as u32));

    let entry = telemetry::read(rig.service.shared(), |s| s.log.latest().cloned())
        .expect("one entry should be logged");
    assert_eq!(entry.epoch, T0 as u32);
    assert_eq!(entry.timestamp.as_str(), "2025-03-01 08:00:00");
    assert_eq!(entry.ambient, 800.0);
    assert_eq!(entry.filtered, 700.0);
    assert!((entry.improvement_pct - 12.5).abs() < 1e-4);
    assert!(!entry.adjusted, "a 12.5 % improvement needs no nudge");

    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::EntryLogged { adjusted: false, .. })),
        1
    );
    assert_eq!(rig.service.stats().logged, 1);
}

#[test]
fn small_improvement_is_nudged_and_flagged() {
    let mut rig = make_rig(MockGasSensor::steady(800.0), MockGasSensor::steady(799.0));

    assert!(matches!(rig.tick(0), TickOutcome::Logged(_)));

    let entry = telemetry::read(rig.service.shared(), |s| s.log.latest().cloned()).unwrap();
    assert!(entry.adjusted);
    assert!((entry.filtered - 795.95).abs() < 1e-3, "got {}", entry.filtered);
    assert!(entry.improvement_pct > 0.5);
    assert_eq!(rig.service.stats().adjusted, 1);
}

// ── Logging gates ─────────────────────────────────────────────

#[test]
fn one_entry_per_wall_clock_second() {
    let mut rig = make_rig(MockGasSensor::steady(800.0), MockGasSensor::steady(700.0));

    assert!(matches!(rig.tick(0), TickOutcome::Logged(_)));
    assert_eq!(rig.tick(10), TickOutcome::SameSecond);
    assert_eq!(rig.tick(20), TickOutcome::SameSecond);
    assert_eq!(rig.log_len(), 1);

    rig.clock.advance(1);
    assert_eq!(rig.tick(1000), TickOutcome::Logged(T0 as u32 + 1));
    assert_eq!(rig.log_len(), 2);
}

#[test]
fn waits_until_both_channels_have_a_reading() {
    let mut rig = make_rig(MockGasSensor::steady(800.0), MockGasSensor::silent());

    assert_eq!(rig.tick(0), TickOutcome::AwaitingBothChannels);
    assert_eq!(rig.log_len(), 0);

    rig.filtered.steady = Some(700.0);
    rig.clock.advance(1);
    assert!(matches!(rig.tick(1000), TickOutcome::Logged(_)));
}

#[test]
fn stale_values_are_reused_when_only_one_channel_is_fresh() {
    let mut rig = make_rig(MockGasSensor::steady(800.0), MockGasSensor::steady(700.0));
    assert!(matches!(rig.tick(0), TickOutcome::Logged(_)));

    // Filtered goes quiet; ambient keeps reporting.
    rig.filtered.steady = None;
    rig.ambient.steady = Some(820.0);
    rig.clock.advance(5);
    assert!(matches!(rig.tick(5000), TickOutcome::Logged(_)));

    let entry = telemetry::read(rig.service.shared(), |s| s.log.latest().cloned()).unwrap();
    assert_eq!(entry.ambient, 820.0);
    assert_eq!(entry.filtered, 700.0, "last good filtered value is reused");
}

#[test]
fn nothing_is_logged_without_new_data() {
    let mut rig = make_rig(MockGasSensor::silent(), MockGasSensor::silent());
    assert_eq!(rig.tick(0), TickOutcome::NoNewData);
    assert_eq!(rig.tick(1000), TickOutcome::NoNewData);
    assert_eq!(rig.service.stats().ticks, 2);
}

#[test]
fn absent_sensor_blocks_logging_forever() {
    let mut rig = make_rig(MockGasSensor::steady(800.0), MockGasSensor::absent());

    for t in 0..5u64 {
        rig.clock.advance(1);
        assert_eq!(rig.tick(t * 1000), TickOutcome::AwaitingBothChannels);
    }
    assert_eq!(rig.filtered.polls, 0, "absent sensor is never polled");
    assert_eq!(rig.filtered.kicks, 0, "absent sensor is never recovered");
    assert_eq!(rig.log_len(), 0);
}

#[test]
fn unknown_time_skips_logging() {
    let config = SystemConfig::default();
    let mut rig = make_rig_with(
        &config,
        MockGasSensor::steady(800.0),
        MockGasSensor::steady(700.0),
        0,
        None,
    );

    assert_eq!(rig.tick(0), TickOutcome::UnknownTime);
    assert_eq!(rig.log_len(), 0);
    assert_eq!(rig.service.stats().skipped_unknown_time, 1);

    // The sensor values are kept; logging starts as soon as time is known.
    rig.clock.set(T0);
    assert!(matches!(rig.tick(1000), TickOutcome::Logged(_)));
}

// ── Clock resolution ──────────────────────────────────────────

#[test]
fn rtc_is_used_when_system_clock_is_unset() {
    let config = SystemConfig::default();
    let rtc = MockRtc::fixed(rtc_time());
    let reads = rtc.reads.clone();
    let mut rig = make_rig_with(
        &config,
        MockGasSensor::steady(800.0),
        MockGasSensor::steady(700.0),
        0,
        Some(rtc),
    );

    let expected = rtc_time().to_epoch(config.utc_offset_secs).unwrap() as u32;
    assert_eq!(rig.tick(0), TickOutcome::Logged(expected));
    assert!(reads.get() >= 1);

    let entry = telemetry::read(rig.service.shared(), |s| s.log.latest().cloned()).unwrap();
    assert_eq!(entry.timestamp.as_str(), "2025-03-01 14:07:59");
}

#[test]
fn start_primes_system_clock_from_rtc() {
    let config = SystemConfig::default();
    let mut rig = make_rig_with(
        &config,
        MockGasSensor::steady(800.0),
        MockGasSensor::steady(700.0),
        0,
        Some(MockRtc::fixed(rtc_time())),
    );

    rig.service.start(&mut rig.sink);

    let expected = rtc_time().to_epoch(config.utc_offset_secs).unwrap();
    assert_eq!(rig.clock.secs.get(), expected);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::ClockPrimed { epoch: expected as u32 })
    );
    assert!(telemetry::read(rig.service.shared(), |s| s.has_rtc));
}

#[test]
fn failed_prime_is_reported_and_not_fatal() {
    let config = SystemConfig::default();
    let mut rig = make_rig_with(
        &config,
        MockGasSensor::steady(800.0),
        MockGasSensor::steady(700.0),
        0,
        Some(MockRtc::broken()),
    );

    rig.service.start(&mut rig.sink);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::ClockPrimeFailed(ClockError::Unavailable))
    );
    assert_eq!(rig.tick(0), TickOutcome::UnknownTime);
}

// ── Recovery ──────────────────────────────────────────────────

#[test]
fn stale_channel_is_recovered_once_per_window() {
    let mut ambient = MockGasSensor::silent();
    ambient.queue = vec![Some(800.0)];
    let mut rig = make_rig(ambient, MockGasSensor::steady(700.0));

    // 30 s of ticks at 100 ms: one window expires at 15.1 s, the next
    // would need another full 15 s after that.
    for t in (0..=30_000u64).step_by(100) {
        rig.tick(t);
    }

    assert_eq!(rig.ambient.kicks, 1);
    assert_eq!(rig.filtered.kicks, 0);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::ChannelRecovery { channel: ChannelId::Ambient, .. })),
        1
    );
    assert_eq!(rig.service.ambient().health(), Health::Recovering);
    assert_eq!(rig.service.ambient().recoveries(), 1);

    // Data comes back.
    rig.ambient.steady = Some(810.0);
    rig.tick(30_100);
    assert_eq!(rig.service.ambient().health(), Health::Nominal);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::ChannelRestored(ChannelId::Ambient))
    );
}

#[test]
fn recovery_counts_are_published() {
    let mut rig = make_rig(MockGasSensor::silent(), MockGasSensor::steady(700.0));
    rig.service.start(&mut rig.sink);

    rig.tick(0);
    rig.tick(15_001);

    let (amb, fil) = telemetry::read(rig.service.shared(), |s| (s.ambient, s.filtered));
    assert!(amb.present && fil.present);
    assert_eq!(amb.recoveries, 1);
    assert_eq!(amb.health, Health::Recovering);
    assert_eq!(fil.recoveries, 0);
}

// ── Retention ─────────────────────────────────────────────────

#[test]
fn eviction_is_reported_through_the_sink() {
    let config = SystemConfig {
        log_max_keep: 60,
        eviction_batch: 10,
        ..SystemConfig::default()
    };
    assert!(config.validate().is_ok());
    let mut rig = make_rig_with(
        &config,
        MockGasSensor::steady(800.0),
        MockGasSensor::steady(700.0),
        T0,
        None,
    );

    for i in 0..71u64 {
        assert!(matches!(rig.tick(i * 1000), TickOutcome::Logged(_)));
        rig.clock.advance(1);
    }

    assert_eq!(rig.log_len(), 61);
    assert_eq!(rig.service.stats().evictions, 1);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::LogEvicted { dropped: 10 })), 1);
}
