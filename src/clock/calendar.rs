//! Calendar time as held by the RTC, and its epoch / text conversions.
//!
//! The DS3231 stores local wall time.  Conversions to and from unix epoch
//! go through a fixed UTC offset taken from [`SystemConfig`](crate::config::SystemConfig).

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};
use core::fmt::Write;

/// Text rendered when no clock is available.
pub const TIMESTAMP_SENTINEL: &str = "0000-00-00 00:00:00";

/// `"YYYY-MM-DD HH:MM:SS"` (19 chars; one spare for 5-digit years).
pub type TimestampText = heapless::String<20>;

/// Broken-down local wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CalendarTime {
    /// Local wall time for `epoch` at the given UTC offset.
    pub fn from_epoch(epoch: i64, utc_offset_secs: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(utc_offset_secs)?;
        let local = DateTime::from_timestamp(epoch, 0)?.with_timezone(&offset);
        Some(Self {
            year: u16::try_from(local.year()).ok()?,
            month: local.month() as u8,
            day: local.day() as u8,
            hour: local.hour() as u8,
            minute: local.minute() as u8,
            second: local.second() as u8,
        })
    }

    /// Unix epoch for this local wall time.  `None` if the fields do not
    /// form a real date (e.g. 2025-02-30 or hour 25).
    pub fn to_epoch(&self, utc_offset_secs: i32) -> Option<i64> {
        let naive = NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?
        .and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )?;
        Some(naive.and_utc().timestamp() - i64::from(utc_offset_secs))
    }

    /// Year inside `[min_year, max_year]`.  Corrupted I2C reads tend to land
    /// far outside any sane window, so this doubles as a cheap sanity check.
    pub fn is_plausible(&self, min_year: u16, max_year: u16) -> bool {
        (min_year..=max_year).contains(&self.year)
    }

    /// ISO weekday, Monday = 1 … Sunday = 7.
    pub fn weekday(&self) -> Option<u8> {
        let date = NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?;
        Some(date.weekday().number_from_monday() as u8)
    }

    pub fn timestamp_text(&self) -> TimestampText {
        let mut s = TimestampText::new();
        let _ = write!(
            s,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        );
        s
    }
}

/// The `"0000-00-00 00:00:00"` placeholder as a [`TimestampText`].
pub fn sentinel_timestamp() -> TimestampText {
    let mut s = TimestampText::new();
    let _ = s.push_str(TIMESTAMP_SENTINEL);
    s
}
