//! Rotating interval windows.
//!
//! A window is an ascending, contiguous run of fixed-length buckets aligned
//! to the Unix epoch. After any rotation it holds exactly
//! `retention_count + 1` buckets: `retention_count` completed ones and the
//! in-progress bucket containing `now`, which is always last.
//!
//! Rotation is a pure function of `now` and the current contents:
//!
//! ```text
//! current = floor(now, L)
//! oldest  = current - retention_count * L
//! evict front while front.end < oldest
//! fill from (last.start + L | oldest) while start <= current
//! ```
//!
//! so a second call with the same `now` is a no-op, any gap is filled bucket
//! by bucket, and a fully stale window is emptied and reseeded. A `now`
//! older than the newest bucket leaves everything untouched.

pub mod interval;

pub use interval::Interval;

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};
use dt_config::{TrackerConfig, MAX_RETENTION_COUNT};
use serde::{Deserialize, Serialize};

/// Which event stream a window counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Views,
    Demos,
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::Views => write!(f, "views"),
            Stream::Demos => write!(f, "demos"),
        }
    }
}

/// What a rotation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RotationStats {
    pub evicted: usize,
    pub appended: usize,
    /// `now` fell before the newest bucket; nothing changed.
    pub clock_behind: bool,
}

impl RotationStats {
    pub fn changed(&self) -> bool {
        self.evicted > 0 || self.appended > 0
    }
}

/// Floor `t` to the start of its bucket.
///
/// Boundaries sit on multiples of `length` counted from the Unix epoch, so
/// two windows with the same length agree on them no matter when they were
/// first rotated. Sub-second parts of `length` are ignored.
pub fn align_to_bucket(t: DateTime<Utc>, length: TimeDelta) -> DateTime<Utc> {
    let secs = length.num_seconds().max(1);
    let floored = t.timestamp().div_euclid(secs) * secs;
    DateTime::from_timestamp(floored, 0).unwrap_or(t)
}

/// Fixed-capacity rotating sequence of buckets for one stream.
#[derive(Debug, Clone)]
pub struct IntervalWindow {
    stream: Stream,
    bucket_length: TimeDelta,
    retention_count: usize,
    buckets: VecDeque<Interval>,
}

impl IntervalWindow {
    /// Empty window. `bucket_length_secs` is clamped to at least one second
    /// and `retention_count` to at most `MAX_RETENTION_COUNT`.
    pub fn new(stream: Stream, bucket_length_secs: u64, retention_count: usize) -> Self {
        let secs = i64::try_from(bucket_length_secs.max(1)).unwrap_or(i64::MAX);
        let bucket_length = TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX);
        let retention_count = retention_count.min(MAX_RETENTION_COUNT);
        IntervalWindow {
            stream,
            bucket_length,
            retention_count,
            buckets: VecDeque::new(),
        }
    }

    pub fn from_config(stream: Stream, config: &TrackerConfig) -> Self {
        Self::new(stream, config.bucket_length_secs, config.retention_count)
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    pub fn bucket_length(&self) -> TimeDelta {
        self.bucket_length
    }

    pub fn retention_count(&self) -> usize {
        self.retention_count
    }

    /// Bring the window up to `now`.
    pub fn rotate(&mut self, now: DateTime<Utc>) -> RotationStats {
        let mut stats = RotationStats::default();
        let current = align_to_bucket(now, self.bucket_length);

        if let Some(last) = self.buckets.back() {
            if current < last.start() {
                stats.clock_behind = true;
                return stats;
            }
        }

        let span = i32::try_from(self.retention_count)
            .ok()
            .and_then(|n| self.bucket_length.checked_mul(n))
            .unwrap_or(TimeDelta::MAX);
        let oldest = current
            .checked_sub_signed(span)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        while self.buckets.front().is_some_and(|b| b.end() < oldest) {
            self.buckets.pop_front();
            stats.evicted += 1;
        }

        let mut next = match self.buckets.back() {
            Some(last) => match last.start().checked_add_signed(self.bucket_length) {
                Some(t) => t,
                None => return stats,
            },
            None => oldest,
        };
        while next <= current {
            self.buckets.push_back(Interval::new(next, self.bucket_length));
            stats.appended += 1;
            match next.checked_add_signed(self.bucket_length) {
                Some(t) => next = t,
                None => break,
            }
        }

        stats
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// All buckets, oldest first.
    pub fn buckets(&self) -> impl DoubleEndedIterator<Item = &Interval> + ExactSizeIterator {
        self.buckets.iter()
    }

    pub fn in_progress(&self) -> Option<&Interval> {
        self.buckets.back()
    }

    pub(crate) fn in_progress_mut(&mut self) -> Option<&mut Interval> {
        self.buckets.back_mut()
    }

    #[cfg(test)]
    pub(crate) fn buckets_mut(&mut self) -> std::collections::vec_deque::IterMut<'_, Interval> {
        self.buckets.iter_mut()
    }

    /// Number of completed buckets.
    pub fn completed_len(&self) -> usize {
        self.buckets.len().saturating_sub(1)
    }

    /// Completed buckets, newest first. The in-progress bucket is skipped.
    pub fn completed_newest_first(&self) -> impl Iterator<Item = &Interval> {
        self.buckets.iter().rev().skip(1)
    }

    /// Sum of event counts over the `n` most recent completed buckets, or
    /// over all of them when fewer exist.
    pub fn sum_completed(&self, n: usize) -> u64 {
        self.completed_newest_first()
            .take(n)
            .map(Interval::event_count)
            .sum()
    }
}
