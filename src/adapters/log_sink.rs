//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "NO" }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                ambient,
                filtered,
                rtc,
            } => {
                info!(
                    "START | ambient={} filtered={} rtc={}",
                    yes_no(*ambient),
                    yes_no(*filtered),
                    yes_no(*rtc)
                );
            }
            AppEvent::ClockPrimed { epoch } => {
                debug!("TIME | primed, epoch={}", epoch);
            }
            AppEvent::ClockPrimeFailed(e) => {
                warn!("TIME | prime failed: {}", e);
            }
            AppEvent::ChannelRecovery { channel, attempt } => {
                warn!("{} | stale, recovery #{}", channel.tag(), attempt);
            }
            AppEvent::ChannelRestored(channel) => {
                info!("{} | data restored", channel.tag());
            }
            AppEvent::EntryLogged {
                epoch,
                improvement_pct,
                adjusted,
            } => {
                debug!(
                    "LOG | epoch={} imp={:.1}%{}",
                    epoch,
                    improvement_pct,
                    if *adjusted { " (adjusted)" } else { "" }
                );
            }
            AppEvent::LogEvicted { dropped } => {
                debug!("LOG | evicted {} oldest entries", dropped);
            }
        }
    }
}
