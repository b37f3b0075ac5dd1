//! Bounded in-RAM history of logged observations.
//!
//! Append-only.  Once the store holds more than `cap + batch` entries the
//! oldest `batch` are dropped in one go, so the steady-state size oscillates
//! between `cap + 1` and `cap + batch` and eviction runs once per `batch`
//! appends rather than on every append.
//!
//! Every accepted entry gets a sequence number that keeps counting across
//! eviction.  Paged readers (the TSV export) resume from a sequence cursor,
//! which stays correct even if the wall clock stepped backwards.

use std::collections::VecDeque;

use crate::clock::calendar::TimestampText;
use crate::config::SystemConfig;

/// One logged observation.  Never mutated after append.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub epoch: u32,
    pub timestamp: TimestampText,
    pub ambient: f32,
    pub filtered: f32,
    pub improvement_pct: f32,
    /// The positivity policy altered the raw pair.
    pub adjusted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// Appended, then the oldest `n` entries were evicted.
    AppendedAndEvicted(usize),
    /// Epoch 0: wall time unknown.
    RejectedUnknownTime,
    /// Same epoch as the previous append.
    RejectedDuplicate,
}

impl AppendOutcome {
    pub fn accepted(self) -> bool {
        matches!(self, Self::Appended | Self::AppendedAndEvicted(_))
    }
}

/// A bounded slice of entries plus the cursor to continue from.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub entries: Vec<LogEntry>,
    /// Pass back to [`LogStore::page`] for the next slice.
    pub next: u64,
}

impl Page {
    pub fn is_last(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct LogStore {
    entries: VecDeque<LogEntry>,
    cap: usize,
    batch: usize,
    last_epoch: u32,
    /// Sequence number the next accepted entry will get.
    next_seq: u64,
}

impl LogStore {
    pub fn new(cap: usize, batch: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap + batch + 1),
            cap,
            batch,
            last_epoch: 0,
            next_seq: 0,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.log_max_keep, config.eviction_batch)
    }

    pub fn append(&mut self, entry: LogEntry) -> AppendOutcome {
        if entry.epoch == 0 {
            return AppendOutcome::RejectedUnknownTime;
        }
        if entry.epoch == self.last_epoch {
            return AppendOutcome::RejectedDuplicate;
        }

        self.last_epoch = entry.epoch;
        self.entries.push_back(entry);
        self.next_seq += 1;

        if self.entries.len() > self.cap + self.batch {
            self.entries.drain(..self.batch);
            return AppendOutcome::AppendedAndEvicted(self.batch);
        }
        AppendOutcome::Appended
    }

    /// The most recent `limit` entries, oldest first.
    pub fn tail(&self, limit: usize) -> Vec<LogEntry> {
        let start = self.entries.len().saturating_sub(limit);
        self.entries.range(start..).cloned().collect()
    }

    /// Everything retained, oldest first.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &LogEntry> + '_ {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Epoch of the last accepted append, 0 before the first one.
    pub fn last_epoch(&self) -> u32 {
        self.last_epoch
    }

    /// Sequence number of the oldest retained entry.
    pub fn first_seq(&self) -> u64 {
        self.next_seq - self.entries.len() as u64
    }

    /// Sequence number the next accepted entry will get.
    pub fn end_seq(&self) -> u64 {
        self.next_seq
    }

    /// Up to `max` entries starting at sequence `cursor`.  A cursor that
    /// points at already-evicted entries resumes at the oldest retained one.
    pub fn page(&self, cursor: u64, max: usize) -> Page {
        let first = self.first_seq();
        let start = cursor.max(first);
        let offset = ((start - first) as usize).min(self.entries.len());
        let entries: Vec<LogEntry> = self
            .entries
            .range(offset..)
            .take(max)
            .cloned()
            .collect();
        Page {
            next: start + entries.len() as u64,
            entries,
        }
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}
