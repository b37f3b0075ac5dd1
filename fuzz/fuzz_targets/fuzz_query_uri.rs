//! Fuzz target: `TelemetryQuery::dispatch`
//!
//! Feeds arbitrary request URIs to the query surface over a small log and
//! asserts that every reply is well formed: JSON bodies parse, limits stay
//! in range and the export always starts with its header.
//!
//! cargo fuzz run fuzz_query_uri

#![no_main]

use dacmon::api::{EXPORT_HEADER, Reply, TelemetryQuery, leading_int, limit_or_default};
use dacmon::clock::calendar::CalendarTime;
use dacmon::config::SystemConfig;
use dacmon::telemetry::log_store::LogEntry;
use dacmon::telemetry::{self, TelemetryState};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(uri) = core::str::from_utf8(data) else {
        return;
    };

    let _ = leading_int(uri);
    let limit = limit_or_default(Some(uri), 180, 2000);
    assert!((1..=2000).contains(&limit), "limit escaped its range");

    let config = SystemConfig::default();
    let shared = telemetry::shared(TelemetryState::new(&config));
    telemetry::write(&shared, |s| {
        for i in 0..8u32 {
            let epoch = 1_740_787_200 + i;
            let Some(cal) = CalendarTime::from_epoch(i64::from(epoch), config.utc_offset_secs)
            else {
                continue;
            };
            s.log.append(LogEntry {
                epoch,
                timestamp: cal.timestamp_text(),
                ambient: 800.0 + i as f32,
                filtered: if i == 3 { f32::NAN } else { 700.0 },
                improvement_pct: 12.5,
                adjusted: false,
            });
        }
    });

    let query = TelemetryQuery::new(shared, &config);
    match query.dispatch(uri, String::new) {
        Reply::Json(body) => {
            assert!(body.starts_with('{') && body.ends_with('}'), "not a JSON object");
        }
        Reply::Export(chunks) => {
            let all: Vec<String> = chunks.collect();
            assert!(all[0].starts_with(EXPORT_HEADER));
        }
        Reply::Text(_) | Reply::NotFound => {}
    }
});
