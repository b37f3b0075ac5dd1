//! Driver and hardware-adapter tests against the simulated I2C bus.

use super::mock_hw::{NoopDelay, RTC_ADDR, SCD_ADDR, SimBus};

use dacmon::adapters::hardware::{Ds3231Clock, Scd4xSensor};
use dacmon::app::ports::{GasSensorPort, HardwareClockPort};
use dacmon::clock::calendar::CalendarTime;
use dacmon::drivers::ds3231::Ds3231;
use dacmon::drivers::i2c_scan;
use dacmon::sensors::channel::ChannelId;
use dacmon::error::SensorError;
use dacmon::sensors::scd4x::Scd4x;

const STOP: u16 = 0x3F86;
const SERIAL: u16 = 0x3682;
const START: u16 = 0x21B1;
const REINIT: u16 = 0x3646;

/// 2025-03-01 14:07:59 (Saturday) in DS3231 register layout.
const REGS_2025_03_01: [u8; 7] = [0x59, 0x07, 0x14, 0x06, 0x01, 0x03, 0x25];

fn cal(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> CalendarTime {
    CalendarTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
    }
}

// ── SCD4x driver ──────────────────────────────────────────────

#[test]
fn scd4x_probe_reads_serial_after_stop() {
    let bus = SimBus::with_scd(800);
    let mut scd = Scd4x::new(bus.clone(), NoopDelay::default());

    assert_eq!(scd.probe(), Ok(0x1234_5678_9ABC));
    assert_eq!(bus.scd.borrow().commands, vec![STOP, SERIAL]);
}

#[test]
fn scd4x_try_read_waits_for_data_ready() {
    let bus = SimBus::with_scd(812);
    let mut scd = Scd4x::new(bus.clone(), NoopDelay::default());

    assert_eq!(scd.try_read(), Ok(None));

    bus.scd.borrow_mut().ready = true;
    let m = scd.try_read().unwrap().expect("measurement should be ready");
    assert_eq!(m.co2_ppm, 812);
    assert!((m.temperature_c - 25.0).abs() < 0.01, "got {}", m.temperature_c);
    assert!((m.humidity_pct - 37.0).abs() < 0.01, "got {}", m.humidity_pct);

    // Reading consumes the sample.
    assert_eq!(scd.try_read(), Ok(None));
}

#[test]
fn scd4x_rejects_corrupted_words() {
    let bus = SimBus::with_scd(800);
    bus.scd.borrow_mut().corrupt_crc = true;
    let mut scd = Scd4x::new(bus, NoopDelay::default());
    assert_eq!(scd.serial_number(), Err(SensorError::CrcMismatch));
}

#[test]
fn scd4x_absent_sensor_is_bus_error() {
    let mut scd = Scd4x::new(SimBus::default(), NoopDelay::default());
    assert_eq!(scd.probe(), Err(SensorError::BusFailed));
}

#[test]
fn scd4x_kick_restarts_periodic_measurement() {
    let bus = SimBus::with_scd(800);
    let delay = NoopDelay::default();
    let mut scd = Scd4x::new(bus.clone(), delay.clone()).with_settle(30, 10);

    assert_eq!(scd.kick(), Ok(()));
    assert_eq!(bus.scd.borrow().commands, vec![STOP, REINIT, START]);
    assert!(bus.scd.borrow().periodic);
    assert!(delay.total_ms() >= 40, "both settle delays are waited out");
}

// ── SCD4x adapter ─────────────────────────────────────────────

#[test]
fn sensor_adapter_starts_and_kicks_on_begin() {
    let bus = SimBus::with_scd(800);
    let mut sensor = Scd4xSensor::begin(
        Scd4x::new(bus.clone(), NoopDelay::default()),
        ChannelId::Ambient,
    );

    assert!(sensor.present());
    assert_eq!(
        bus.scd.borrow().commands,
        vec![STOP, SERIAL, START, STOP, REINIT, START]
    );
    assert!(bus.scd.borrow().periodic);

    assert_eq!(sensor.poll(), None, "no sample yet");
    bus.scd.borrow_mut().ready = true;
    assert_eq!(sensor.poll(), Some(800.0));
}

#[test]
fn sensor_adapter_reports_absent_sensor() {
    let bus = SimBus::default();
    let mut sensor = Scd4xSensor::begin(
        Scd4x::new(bus.clone(), NoopDelay::default()),
        ChannelId::Filtered,
    );
    assert!(!sensor.present());
    assert_eq!(sensor.poll(), None);
    // Recovery on a dead bus is logged, never panics.
    sensor.recover_cycle();
}

#[test]
fn sensor_adapter_maps_crc_failure_to_no_data() {
    let bus = SimBus::with_scd(800);
    let mut sensor = Scd4xSensor::begin(
        Scd4x::new(bus.clone(), NoopDelay::default()),
        ChannelId::Ambient,
    );
    {
        let mut scd = bus.scd.borrow_mut();
        scd.ready = true;
        scd.corrupt_crc = true;
    }
    assert_eq!(sensor.poll(), None);
}

// ── DS3231 driver ─────────────────────────────────────────────

#[test]
fn ds3231_reads_bcd_calendar() {
    let mut rtc = Ds3231::new(SimBus::with_rtc(REGS_2025_03_01));
    assert!(rtc.probe());
    assert_eq!(rtc.read_calendar(), Ok(cal(2025, 3, 1, 14, 7, 59)));
}

#[test]
fn ds3231_decodes_12_hour_mode() {
    let mut regs = REGS_2025_03_01;
    regs[2] = 0x40 | 0x20 | 0x02; // 12 h, PM, 2 o'clock
    let mut rtc = Ds3231::new(SimBus::with_rtc(regs));
    assert_eq!(rtc.read_calendar().unwrap().hour, 14);

    regs[2] = 0x40 | 0x12; // 12 h, AM, 12 o'clock
    let mut rtc = Ds3231::new(SimBus::with_rtc(regs));
    assert_eq!(rtc.read_calendar().unwrap().hour, 0);
}

#[test]
fn ds3231_rejects_garbage_registers() {
    let mut regs = REGS_2025_03_01;
    regs[1] = 0x7A; // minute "7A" is not BCD
    let mut rtc = Ds3231::new(SimBus::with_rtc(regs));
    assert!(rtc.read_calendar().is_err());
}

#[test]
fn ds3231_set_then_read_round_trips_and_clears_osf() {
    let bus = SimBus::with_rtc([0; 7]);
    let mut rtc = Ds3231::new(bus.clone());
    assert_eq!(rtc.lost_power(), Ok(true));

    let when = cal(2031, 12, 31, 23, 59, 58);
    rtc.set_calendar(&when).unwrap();

    assert_eq!(rtc.read_calendar(), Ok(when));
    assert_eq!(rtc.lost_power(), Ok(false));
}

// ── DS3231 adapter ────────────────────────────────────────────

#[test]
fn clock_adapter_seeds_after_power_loss() {
    let bus = SimBus::with_rtc([0; 7]);
    let delay = NoopDelay::default();
    let mut clock =
        Ds3231Clock::detect(Ds3231::new(bus.clone()), delay.clone()).expect("RTC present");

    let seed = cal(2025, 6, 15, 9, 30, 0);
    assert_eq!(clock.housekeep(Some(&seed)), Ok(true));
    assert_eq!(clock.read_calendar(), Ok(seed));
    assert!(delay.total_ms() >= 10, "waits for the registers to commit");

    let regs = bus.rtc.borrow().regs;
    assert_eq!(regs[0x0F], 0x00, "OSF and EN32kHz cleared");
    assert_eq!(regs[0x0E], 0x04, "INTCN set, square-wave rate bits cleared");

    // Second boot: nothing to do.
    assert_eq!(clock.housekeep(Some(&seed)), Ok(false));
}

#[test]
fn clock_adapter_keeps_time_without_seed() {
    let bus = SimBus::with_rtc(REGS_2025_03_01);
    let mut clock = Ds3231Clock::detect(Ds3231::new(bus.clone()), NoopDelay::default()).unwrap();

    assert_eq!(clock.housekeep(None), Ok(false));
    assert_eq!(bus.rtc.borrow().regs[..7], REGS_2025_03_01);
}

#[test]
fn clock_adapter_serves_plausible_reads() {
    let mut clock =
        Ds3231Clock::detect(Ds3231::new(SimBus::with_rtc(REGS_2025_03_01)), NoopDelay::default())
            .unwrap();
    assert_eq!(
        clock.read_if_plausible(2024, 2099),
        Some(cal(2025, 3, 1, 14, 7, 59))
    );
    assert_eq!(clock.read_if_plausible(2030, 2099), None);
}

#[test]
fn clock_adapter_absent_without_chip() {
    assert!(Ds3231Clock::detect(Ds3231::new(SimBus::default()), NoopDelay::default()).is_none());
}

// ── Bus scan ──────────────────────────────────────────────────

#[test]
fn scan_finds_every_answering_device() {
    let mut bus = SimBus::with_scd(800);
    bus.rtc.borrow_mut().present = true;

    let found = i2c_scan::scan(&mut bus);
    assert_eq!(found.as_slice(), &[SCD_ADDR, RTC_ADDR]);
    assert_eq!(
        i2c_scan::render("Bus1 (21/22)", &found),
        "[I2C] Scanning Bus1 (21/22)...\n  Found 0x62\n  Found 0x68\n"
    );
}

#[test]
fn scan_of_empty_bus_finds_nothing() {
    assert!(i2c_scan::scan(&mut SimBus::default()).is_empty());
}
