//! Totals over completed buckets.

use std::collections::BTreeMap;

use dt_common::AttributeKey;
use dt_config::tracker::SECONDS_PER_DAY;
use serde::Serialize;

use crate::window::IntervalWindow;

/// Number of buckets spanning 24 hours for this window, at least one.
pub fn daily_bucket_count(window: &IntervalWindow) -> usize {
    let secs = window.bucket_length().num_seconds().max(1) as u64;
    usize::try_from(SECONDS_PER_DAY / secs).unwrap_or(usize::MAX).max(1)
}

/// Event count over the completed buckets covering the last 24 hours.
pub fn last_24h_total(window: &IntervalWindow) -> u64 {
    window.sum_completed(daily_bucket_count(window))
}

/// Event and per-attribute totals over every completed bucket of a window.
///
/// Keys are ordered so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamTotals {
    pub total: u64,
    pub true_counts: BTreeMap<AttributeKey, u64>,
}

impl StreamTotals {
    pub fn from_completed(window: &IntervalWindow) -> Self {
        let mut totals = StreamTotals::default();
        for bucket in window.completed_newest_first() {
            totals.total += bucket.event_count();
            for (key, count) in bucket.true_counts() {
                *totals.true_counts.entry(key.clone()).or_insert(0) += count;
            }
        }
        totals
    }

    pub fn true_count(&self, key: &str) -> u64 {
        self.true_counts.get(key).copied().unwrap_or(0)
    }
}
