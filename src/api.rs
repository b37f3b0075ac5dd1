//! Read-only query surface over the shared telemetry.
//!
//! Transport-agnostic: [`TelemetryQuery::dispatch`] turns a request URI into
//! a [`Reply`], and the ESP-IDF HTTP adapter only copies that onto the wire.
//!
//! | Path             | Parameters            | Body                              |
//! |------------------|-----------------------|-----------------------------------|
//! | `/api/status`    |                       | presence, RTC, log count, health  |
//! | `/api/latest`    |                       | newest entry or `{}`              |
//! | `/api/bootstrap` | `limit` (180)         | `{"logs":[...]}`                  |
//! | `/api/logs`      | `g5` (120), `m1` (180)| `{"g5":[...],"m1":[...]}`         |
//! | `/export.xlsx`   |                       | tab-separated rows, streamed      |
//! | `/i2c-scan`      |                       | plain-text bus listing            |
//!
//! All numbers are rendered with exactly one decimal place.

use core::fmt::Write;

use serde::{Serialize, Serializer};

use crate::config::SystemConfig;
use crate::sensors::channel::ChannelStatus;
use crate::telemetry::buckets::{self, Bucket, BucketSeries};
use crate::telemetry::log_store::{LogEntry, Page};
use crate::telemetry::{self, SharedTelemetry};

pub const EXPORT_HEADER: &str =
    "Timestamp\tCO2 Ambient (ppm)\tCO2 Filtered (ppm)\tImprovement (%)";
pub const EXPORT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const EXPORT_DISPOSITION: &str = "attachment; filename=\"logs.xlsx\"";
/// Rows copied out per lock acquisition while exporting.
pub const EXPORT_PAGE_ROWS: usize = 128;

// ───────────────────────────────────────────────────────────────
// Routing and query parsing
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Status,
    Latest,
    Bootstrap,
    Series,
    Export,
    I2cScan,
    NotFound,
}

impl Route {
    /// Every servable route.
    pub const ALL: [Self; 6] = [
        Self::Status,
        Self::Latest,
        Self::Bootstrap,
        Self::Series,
        Self::Export,
        Self::I2cScan,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Self::Status => "/api/status",
            Self::Latest => "/api/latest",
            Self::Bootstrap => "/api/bootstrap",
            Self::Series => "/api/logs",
            Self::Export => "/export.xlsx",
            Self::I2cScan => "/i2c-scan",
            Self::NotFound => "",
        }
    }

    pub fn resolve(path: &str) -> Self {
        match path {
            "/api/status" => Self::Status,
            "/api/latest" => Self::Latest,
            "/api/bootstrap" => Self::Bootstrap,
            "/api/logs" => Self::Series,
            "/export.xlsx" => Self::Export,
            "/i2c-scan" => Self::I2cScan,
            _ => Self::NotFound,
        }
    }
}

/// `"/a/b?x=1"` → `("/a/b", "x=1")`.
pub fn split_uri(uri: &str) -> (&str, &str) {
    uri.split_once('?').unwrap_or((uri, ""))
}

/// First value of `key` in an `a=1&b=2` query string.
pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Lenient integer parse: optional leading whitespace and sign, then as
/// many digits as are present.  `"12abc"` is 12, `"abc"` is 0.
/// Saturates instead of overflowing.
pub fn leading_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });
    if negative { -magnitude } else { magnitude }
}

/// A limit in `1..=max`, or `default` when missing or out of range.
pub fn limit_or_default(raw: Option<&str>, default: usize, max: usize) -> usize {
    raw.map(leading_int)
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| (1..=max).contains(n))
        .unwrap_or(default)
}

// ───────────────────────────────────────────────────────────────
// Results
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub ambient: ChannelStatus,
    pub filtered: ChannelStatus,
    pub has_rtc: bool,
    pub log_count: usize,
}

/// What a request resolves to.
pub enum Reply {
    Json(String),
    Text(String),
    /// Header line first, then row chunks until exhausted.
    Export(ExportChunks),
    NotFound,
}

/// Defaults and bound for the query limits.
#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    pub bootstrap_default: usize,
    pub g5_default: usize,
    pub m1_default: usize,
    pub max: usize,
}

impl QueryLimits {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            bootstrap_default: config.bootstrap_default_limit,
            g5_default: config.g5_default_limit,
            m1_default: config.m1_default_limit,
            max: config.query_max_limit,
        }
    }
}

/// Cloneable handle the HTTP handlers hold.
#[derive(Clone)]
pub struct TelemetryQuery {
    shared: SharedTelemetry,
    limits: QueryLimits,
}

impl TelemetryQuery {
    pub fn new(shared: SharedTelemetry, config: &SystemConfig) -> Self {
        Self {
            shared,
            limits: QueryLimits::from_config(config),
        }
    }

    pub fn limits(&self) -> QueryLimits {
        self.limits
    }

    pub fn status(&self) -> Status {
        telemetry::read(&self.shared, |s| Status {
            ambient: s.ambient,
            filtered: s.filtered,
            has_rtc: s.has_rtc,
            log_count: s.log.len(),
        })
    }

    pub fn latest(&self) -> Option<LogEntry> {
        telemetry::read(&self.shared, |s| s.log.latest().cloned())
    }

    pub fn bootstrap(&self, limit: usize) -> Vec<LogEntry> {
        telemetry::read(&self.shared, |s| s.log.tail(limit))
    }

    pub fn series(&self, g5_limit: usize, m1_limit: usize) -> BucketSeries {
        telemetry::read(&self.shared, |s| {
            buckets::aggregate(s.log.all(), g5_limit, m1_limit)
        })
    }

    pub fn export_page(&self, cursor: u64, max_rows: usize) -> Page {
        telemetry::read(&self.shared, |s| s.log.page(cursor, max_rows))
    }

    /// Chunked TSV export of everything retained when the export starts.
    pub fn export(&self) -> ExportChunks {
        let (cursor, end) =
            telemetry::read(&self.shared, |s| (s.log.first_seq(), s.log.end_seq()));
        ExportChunks {
            query: self.clone(),
            cursor,
            end,
            header_sent: false,
        }
    }

    /// Resolve a full request URI.  `scan` is only invoked for `/i2c-scan`.
    pub fn dispatch(&self, uri: &str, scan: impl FnOnce() -> String) -> Reply {
        let (path, query) = split_uri(uri);
        let limits = self.limits;
        match Route::resolve(path) {
            Route::Status => Reply::Json(render_status(&self.status())),
            Route::Latest => Reply::Json(render_latest(self.latest().as_ref())),
            Route::Bootstrap => {
                let limit = limit_or_default(
                    query_param(query, "limit"),
                    limits.bootstrap_default,
                    limits.max,
                );
                Reply::Json(render_bootstrap(&self.bootstrap(limit)))
            }
            Route::Series => {
                let g5 = limit_or_default(query_param(query, "g5"), limits.g5_default, limits.max);
                let m1 = limit_or_default(query_param(query, "m1"), limits.m1_default, limits.max);
                Reply::Json(render_series(&self.series(g5, m1)))
            }
            Route::Export => Reply::Export(self.export()),
            Route::I2cScan => Reply::Text(scan()),
            Route::NotFound => Reply::NotFound,
        }
    }
}

/// Iterator over export text chunks.  Each chunk is produced under one
/// short lock hold; rows appended after the export began are not included.
pub struct ExportChunks {
    query: TelemetryQuery,
    cursor: u64,
    end: u64,
    header_sent: bool,
}

impl Iterator for ExportChunks {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if !self.header_sent {
            self.header_sent = true;
            let mut out = String::from(EXPORT_HEADER);
            out.push('\n');
            return Some(out);
        }
        if self.cursor >= self.end {
            return None;
        }
        let mut page = self.query.export_page(self.cursor, EXPORT_PAGE_ROWS);
        // The page may start past the cursor if its rows were evicted.
        let start = page.next - page.entries.len() as u64;
        page.entries.truncate(self.end.saturating_sub(start) as usize);
        if page.is_last() {
            self.cursor = self.end;
            return None;
        }
        self.cursor = start + page.entries.len() as u64;
        Some(render_rows(&page.entries))
    }
}

// ───────────────────────────────────────────────────────────────
// Rendering
// ───────────────────────────────────────────────────────────────

/// A number serialised rounded to one decimal; `null` when not finite.
#[derive(Debug, Clone, Copy)]
pub struct OneDecimal(pub f64);

impl From<f32> for OneDecimal {
    fn from(v: f32) -> Self {
        Self(f64::from(v))
    }
}

impl Serialize for OneDecimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64((self.0 * 10.0).round() / 10.0)
        } else {
            serializer.serialize_none()
        }
    }
}

#[derive(Serialize)]
struct RecoveryCounts {
    ambient: u32,
    filtered: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView {
    has_ambient: bool,
    has_filtered: bool,
    #[serde(rename = "hasRTC")]
    has_rtc: bool,
    log_count: usize,
    ambient_health: &'static str,
    filtered_health: &'static str,
    recoveries: RecoveryCounts,
}

#[derive(Serialize)]
struct EntryView<'a> {
    timestamp: &'a str,
    epoch: u32,
    ambient: OneDecimal,
    filtered: OneDecimal,
    improvement: OneDecimal,
    adjusted: bool,
}

impl<'a> From<&'a LogEntry> for EntryView<'a> {
    fn from(e: &'a LogEntry) -> Self {
        Self {
            timestamp: e.timestamp.as_str(),
            epoch: e.epoch,
            ambient: e.ambient.into(),
            filtered: e.filtered.into(),
            improvement: e.improvement_pct.into(),
            adjusted: e.adjusted,
        }
    }
}

#[derive(Serialize)]
struct BucketView<'a> {
    epoch: u32,
    timestamp: &'a str,
    ambient: OneDecimal,
    filtered: OneDecimal,
    improvement: OneDecimal,
}

impl<'a> From<&'a Bucket> for BucketView<'a> {
    fn from(b: &'a Bucket) -> Self {
        Self {
            epoch: b.last_epoch,
            timestamp: b.last_timestamp.as_str(),
            ambient: OneDecimal(b.mean_ambient()),
            filtered: OneDecimal(b.mean_filtered()),
            improvement: OneDecimal(b.mean_improvement()),
        }
    }
}

#[derive(Serialize)]
struct BootstrapView<'a> {
    logs: Vec<EntryView<'a>>,
}

#[derive(Serialize)]
struct SeriesView<'a> {
    g5: Vec<BucketView<'a>>,
    m1: Vec<BucketView<'a>>,
}

fn health_label(ch: &ChannelStatus) -> &'static str {
    if ch.present { ch.health.as_str() } else { "absent" }
}

fn to_json<T: Serialize>(value: &T) -> String {
    // Views hold only strings, bools and numbers; serialisation cannot fail.
    serde_json::to_string(value).unwrap_or_else(|_| String::from("{}"))
}

pub fn render_status(status: &Status) -> String {
    to_json(&StatusView {
        has_ambient: status.ambient.present,
        has_filtered: status.filtered.present,
        has_rtc: status.has_rtc,
        log_count: status.log_count,
        ambient_health: health_label(&status.ambient),
        filtered_health: health_label(&status.filtered),
        recoveries: RecoveryCounts {
            ambient: status.ambient.recoveries,
            filtered: status.filtered.recoveries,
        },
    })
}

pub fn render_latest(entry: Option<&LogEntry>) -> String {
    entry.map_or_else(|| String::from("{}"), |e| to_json(&EntryView::from(e)))
}

pub fn render_bootstrap(entries: &[LogEntry]) -> String {
    to_json(&BootstrapView {
        logs: entries.iter().map(EntryView::from).collect(),
    })
}

pub fn render_series(series: &BucketSeries) -> String {
    to_json(&SeriesView {
        g5: series.five_second.iter().map(BucketView::from).collect(),
        m1: series.one_minute.iter().map(BucketView::from).collect(),
    })
}

/// `timestamp\tambient\tfiltered\timprovement\n` per entry.
pub fn render_rows(entries: &[LogEntry]) -> String {
    let mut out = String::with_capacity(entries.len() * 40);
    for e in entries {
        out.push_str(&e.timestamp);
        for v in [e.ambient, e.filtered, e.improvement_pct] {
            out.push('\t');
            push_one_decimal(&mut out, v);
        }
        out.push('\n');
    }
    out
}

fn push_one_decimal(out: &mut String, v: f32) {
    if v.is_nan() {
        out.push_str("nan");
    } else if v.is_infinite() {
        out.push_str(if v > 0.0 { "inf" } else { "-inf" });
    } else {
        let _ = write!(out, "{v:.1}");
    }
}
