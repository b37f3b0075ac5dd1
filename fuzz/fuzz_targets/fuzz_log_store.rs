//! Fuzz target: `LogStore::append` / `LogStore::page`
//!
//! Interprets the input as a stream of little-endian u16 epoch deltas
//! (including backward steps and zeros) and checks the retention bounds
//! and paging after every append.
//!
//! cargo fuzz run fuzz_log_store

#![no_main]

use dacmon::clock::calendar::TimestampText;
use dacmon::telemetry::buckets;
use dacmon::telemetry::log_store::{LogEntry, LogStore};
use libfuzzer_sys::fuzz_target;

const CAP: usize = 32;
const BATCH: usize = 8;

fuzz_target!(|data: &[u8]| {
    let mut store = LogStore::new(CAP, BATCH);
    let mut epoch: u32 = 1_000;

    for pair in data.chunks_exact(2) {
        let step = i16::from_le_bytes([pair[0], pair[1]]);
        epoch = if step == i16::MIN {
            0
        } else {
            epoch.saturating_add_signed(i32::from(step) % 64)
        };
        store.append(LogEntry {
            epoch,
            timestamp: TimestampText::new(),
            ambient: f32::from(pair[0]),
            filtered: f32::from(pair[1]),
            improvement_pct: 0.0,
            adjusted: false,
        });
        assert!(store.len() <= CAP + BATCH, "retention bound exceeded");
    }

    let mut cursor = 0;
    let mut rows = 0;
    loop {
        let page = store.page(cursor, 5);
        if page.is_last() {
            break;
        }
        rows += page.entries.len();
        cursor = page.next;
    }
    assert_eq!(rows, store.len());

    let series = buckets::aggregate(store.all(), 10, 10);
    assert!(series.five_second.len() <= 10 && series.one_minute.len() <= 10);
});
