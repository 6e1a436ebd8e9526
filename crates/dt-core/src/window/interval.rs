//! A single time bucket.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use dt_common::AttributeKey;
use serde::{Deserialize, Serialize};

use crate::ingest::Attributes;

/// Events counted over `[start, end]`.
///
/// `true_counts` only has keys for attributes that were observed as true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub(crate) event_count: u64,
    pub(crate) true_counts: HashMap<AttributeKey, u64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    /// Empty bucket starting at `start`. The end is inclusive, one
    /// nanosecond before the next bucket starts.
    pub fn new(start: DateTime<Utc>, length: TimeDelta) -> Self {
        let end = start
            .checked_add_signed(length - TimeDelta::nanoseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Interval {
            event_count: 0,
            true_counts: HashMap::new(),
            start,
            end,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn true_counts(&self) -> &HashMap<AttributeKey, u64> {
        &self.true_counts
    }

    /// Count of events with `key` set to true; zero when never seen.
    pub fn true_count(&self, key: &str) -> u64 {
        self.true_counts.get(key).copied().unwrap_or(0)
    }

    /// Count of events matching `key == value`.
    ///
    /// For `value == false` this is every event without the flag set, so an
    /// attribute never seen as true yields the full event count.
    pub fn filtered_count(&self, key: &str, value: bool) -> u64 {
        let true_count = self.true_count(key);
        if value {
            true_count
        } else {
            self.event_count.saturating_sub(true_count)
        }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }

    /// Count one event carrying `attrs`. False flags are not stored.
    pub(crate) fn record(&mut self, attrs: &Attributes) {
        self.event_count += 1;
        for (key, flag) in attrs {
            if *flag {
                *self.true_counts.entry(key.clone()).or_insert(0) += 1;
            }
        }
    }
}
