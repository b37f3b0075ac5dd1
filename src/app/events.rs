//! Outbound application events.
//!
//! The [`TelemetryService`](super::service::TelemetryService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them (serial log today).

use crate::error::ClockError;
use crate::sensors::channel::ChannelId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started; carries boot-time presence.
    Started {
        ambient: bool,
        filtered: bool,
        rtc: bool,
    },

    /// The system clock was seeded from the RTC.
    ClockPrimed { epoch: u32 },

    /// Priming was skipped or failed; time falls back per read.
    ClockPrimeFailed(ClockError),

    /// A channel went stale and its acquisition cycle was restarted.
    ChannelRecovery { channel: ChannelId, attempt: u32 },

    /// First good read after a recovery.
    ChannelRestored(ChannelId),

    /// A new entry reached the log.
    EntryLogged {
        epoch: u32,
        improvement_pct: f32,
        adjusted: bool,
    },

    /// The oldest batch of entries was dropped.
    LogEvicted { dropped: usize },
}
