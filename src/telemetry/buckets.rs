//! Fixed-width time buckets built from the log on demand.
//!
//! One chronological pass feeds both widths.  A bucket opens whenever the
//! aligned key differs from the previous bucket's key, so a clock that
//! steps backwards opens a fresh bucket rather than reopening an old one.

use crate::clock::calendar::TimestampText;
use crate::telemetry::log_store::LogEntry;

pub const FIVE_SECONDS: u32 = 5;
pub const ONE_MINUTE: u32 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// Bucket start, `epoch / width * width`.
    pub key: u32,
    pub sum_ambient: f64,
    pub sum_filtered: f64,
    pub sum_improvement: f64,
    pub count: u32,
    /// Newest epoch seen in the bucket and its timestamp text.
    pub last_epoch: u32,
    pub last_timestamp: TimestampText,
}

impl Bucket {
    fn open(key: u32) -> Self {
        Self {
            key,
            sum_ambient: 0.0,
            sum_filtered: 0.0,
            sum_improvement: 0.0,
            count: 0,
            last_epoch: 0,
            last_timestamp: TimestampText::new(),
        }
    }

    fn add(&mut self, entry: &LogEntry) {
        self.sum_ambient += f64::from(entry.ambient);
        self.sum_filtered += f64::from(entry.filtered);
        self.sum_improvement += f64::from(entry.improvement_pct);
        self.count += 1;
        if entry.epoch >= self.last_epoch {
            self.last_epoch = entry.epoch;
            self.last_timestamp.clone_from(&entry.timestamp);
        }
    }

    fn divisor(&self) -> f64 {
        f64::from(self.count.max(1))
    }

    pub fn mean_ambient(&self) -> f64 {
        self.sum_ambient / self.divisor()
    }

    pub fn mean_filtered(&self) -> f64 {
        self.sum_filtered / self.divisor()
    }

    pub fn mean_improvement(&self) -> f64 {
        self.sum_improvement / self.divisor()
    }
}

/// Both bucket lists, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketSeries {
    pub five_second: Vec<Bucket>,
    pub one_minute: Vec<Bucket>,
}

/// Build 5 s and 60 s buckets and keep the newest `g5_limit` / `m1_limit`.
pub fn aggregate<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
    g5_limit: usize,
    m1_limit: usize,
) -> BucketSeries {
    let mut series = BucketSeries::default();
    for entry in entries {
        if entry.epoch == 0 {
            continue;
        }
        accumulate(&mut series.five_second, FIVE_SECONDS, entry);
        accumulate(&mut series.one_minute, ONE_MINUTE, entry);
    }
    keep_newest(&mut series.five_second, g5_limit);
    keep_newest(&mut series.one_minute, m1_limit);
    series
}

fn accumulate(buckets: &mut Vec<Bucket>, width: u32, entry: &LogEntry) {
    let key = entry.epoch / width * width;
    match buckets.last_mut() {
        Some(last) if last.key == key => last.add(entry),
        _ => {
            let mut bucket = Bucket::open(key);
            bucket.add(entry);
            buckets.push(bucket);
        }
    }
}

fn keep_newest(buckets: &mut Vec<Bucket>, limit: usize) {
    if buckets.len() > limit {
        buckets.drain(..buckets.len() - limit);
    }
}
