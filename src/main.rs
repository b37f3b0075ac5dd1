//! DAC CO2 Monitor Firmware: main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Scd4xSensor ×2    Ds3231Clock     SystemWallClock  LogEventSink│
//! │  (GasSensorPort)   (HwClockPort)   (SysClockPort)   (EventSink)│
//! │  AccessPoint       HTTP server ──▶ api::TelemetryQuery         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        TelemetryService (pure logic)                   │    │
//! │  │  SensorChannel ×2 · TimeSource · ImprovementModel      │    │
//! │  └──────────────────────────┬─────────────────────────────┘    │
//! │                             ▼                                  │
//! │                 SharedTelemetry (LogStore + status)            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use embedded_hal_bus::i2c::MutexDevice;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::{Delay, FreeRtos};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use dacmon::adapters::hardware::{Ds3231Clock, Scd4xSensor};
use dacmon::adapters::http::{self, ScanFn};
use dacmon::adapters::log_sink::LogEventSink;
use dacmon::adapters::time::{MonotonicClock, SystemWallClock};
use dacmon::adapters::wifi::{AccessPoint, ApCredentials};
use dacmon::api::TelemetryQuery;
use dacmon::app::service::TelemetryService;
use dacmon::clock::{self, TimeSource};
use dacmon::config::SystemConfig;
use dacmon::drivers::ds3231::Ds3231;
use dacmon::drivers::i2c_scan;
use dacmon::pins;
use dacmon::sensors::channel::{ChannelId, SensorChannel};
use dacmon::sensors::scd4x::Scd4x;
use dacmon::telemetry::{self, TelemetryState};

type Bus = Mutex<I2cDriver<'static>>;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  DAC CO2 Monitor v{}               ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate()?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();

    // ── 2. Access point (failure is logged, not fatal) ────────
    let mut ap = AccessPoint::new(ApCredentials::new(pins::AP_SSID, pins::AP_PASSWORD)?);
    if let Err(e) = ap.start(peripherals.modem, sysloop, nvs) {
        warn!("WiFi: {}, continuing without network", e);
    }

    // ── 3. I2C buses ──────────────────────────────────────────
    let bus1: &'static Bus = Box::leak(Box::new(Mutex::new(I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(pins::I2C1_BAUD_HZ)),
    )?)));
    let bus2: &'static Bus = Box::leak(Box::new(Mutex::new(I2cDriver::new(
        peripherals.i2c1,
        peripherals.pins.gpio18,
        peripherals.pins.gpio19,
        &I2cConfig::new().baudrate(Hertz(pins::I2C2_BAUD_HZ)),
    )?)));

    let scan: ScanFn = Arc::new(move || {
        let mut out = i2c_scan::render(
            &pins::bus_label(1, pins::I2C1_SDA_GPIO, pins::I2C1_SCL_GPIO),
            &i2c_scan::scan(&mut MutexDevice::new(bus1)),
        );
        out.push_str(&i2c_scan::render(
            &pins::bus_label(2, pins::I2C2_SDA_GPIO, pins::I2C2_SCL_GPIO),
            &i2c_scan::scan(&mut MutexDevice::new(bus2)),
        ));
        out
    });
    for line in scan().lines() {
        info!("{}", line);
    }

    // ── 4. Devices ────────────────────────────────────────────
    let mut ambient = Scd4xSensor::begin(
        Scd4x::new(MutexDevice::new(bus1), Delay::new_default())
            .with_settle(config.recovery_stop_settle_ms, config.recovery_reinit_settle_ms),
        ChannelId::Ambient,
    );
    let mut filtered = Scd4xSensor::begin(
        Scd4x::new(MutexDevice::new(bus2), Delay::new_default())
            .with_settle(config.recovery_stop_settle_ms, config.recovery_reinit_settle_ms),
        ChannelId::Filtered,
    );

    let mut rtc = Ds3231Clock::detect(Ds3231::new(MutexDevice::new(bus1)), Delay::new_default());
    if let Some(rtc) = rtc.as_mut() {
        let seed = clock::build_time(config.utc_offset_secs);
        if let Err(e) = rtc.housekeep(seed.as_ref()) {
            warn!("RTC: housekeeping failed: {}", e);
        }
    }

    // ── 5. Core ───────────────────────────────────────────────
    let monotonic = MonotonicClock::new();
    let now_ms = monotonic.uptime_ms();
    let shared = telemetry::shared(TelemetryState::new(&config));
    let mut log_sink = LogEventSink::new();

    let mut service = TelemetryService::new(
        &config,
        TimeSource::new(SystemWallClock::new(), rtc, &config),
        SensorChannel::detect(ChannelId::Ambient, &mut ambient, config.stale_after_ms, now_ms),
        SensorChannel::detect(ChannelId::Filtered, &mut filtered, config.stale_after_ms, now_ms),
        shared.clone(),
    );
    service.start(&mut log_sink);

    // ── 6. HTTP ───────────────────────────────────────────────
    let _server = http::start(TelemetryQuery::new(shared, &config), scan)?;

    info!("System ready. Entering polling loop.");

    // ── 7. Polling loop ───────────────────────────────────────
    loop {
        service.tick(monotonic.uptime_ms(), &mut ambient, &mut filtered, &mut log_sink);
        FreeRtos::delay_ms(config.poll_yield_ms);
    }
}
