//! Smoothed event counts.
//!
//! The series is read newest first from completed buckets, optionally
//! narrowed to events matching one attribute value, and averaged with a
//! trailing window of `smoothing_window` buckets. Point `i` of the result
//! averages completed buckets `i ..= i + smoothing_window - 1` (counting back
//! from the newest completed bucket) and is stamped with the start of
//! completed bucket `i`.

use chrono::{DateTime, Utc};
use dt_common::{AttributeKey, Error, Result};
use dt_math::{series_len_for, trailing_moving_average};
use serde::{Deserialize, Serialize};

use crate::logging::{event_names, DiagnosticSink, LogEvent, Stage};
use crate::window::{Interval, IntervalWindow};

/// One smoothed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AveragePoint {
    pub value: f64,
    pub time: DateTime<Utc>,
}

/// Restrict counts to events whose attribute `key` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub key: AttributeKey,
    pub value: bool,
}

impl AttributeFilter {
    pub fn new(key: impl Into<AttributeKey>, value: bool) -> Self {
        AttributeFilter {
            key: key.into(),
            value,
        }
    }

    fn count(&self, bucket: &Interval) -> u64 {
        bucket.filtered_count(self.key.as_str(), self.value)
    }
}

/// How many points a request will actually produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SmoothingPlan {
    pub requested: usize,
    pub duration: usize,
    pub smoothing_window: usize,
    /// The request did not fit the window and was shortened.
    pub truncated: bool,
}

impl SmoothingPlan {
    /// Number of completed buckets the plan reads.
    pub fn series_len(&self) -> usize {
        series_len_for(self.duration, self.smoothing_window).unwrap_or(0)
    }
}

/// Fit `requested` points into a window of `window_len` buckets.
///
/// When `requested + smoothing_window` exceeds the window length the
/// duration becomes `window_len - smoothing_window`; a result below one
/// point is `InsufficientData`.
pub fn plan_duration(
    requested: usize,
    smoothing_window: usize,
    window_len: usize,
) -> Result<SmoothingPlan> {
    let insufficient = || Error::InsufficientData {
        requested,
        smoothing_window,
        available: window_len,
    };
    if requested == 0 || smoothing_window == 0 {
        return Err(insufficient());
    }

    let fits = requested
        .checked_add(smoothing_window)
        .is_some_and(|needed| needed <= window_len);
    let duration = if fits {
        requested
    } else {
        window_len.saturating_sub(smoothing_window)
    };
    if duration < 1 {
        return Err(insufficient());
    }

    Ok(SmoothingPlan {
        requested,
        duration,
        smoothing_window,
        truncated: !fits,
    })
}

/// Moving average over an already rotated window, newest point first.
pub fn moving_average(
    window: &IntervalWindow,
    requested: usize,
    smoothing_window: usize,
    filter: Option<&AttributeFilter>,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<AveragePoint>> {
    let plan = match plan_duration(requested, smoothing_window, window.len()) {
        Ok(plan) => plan,
        Err(err) => {
            sink.record(
                LogEvent::warn(
                    event_names::SMOOTH_INSUFFICIENT_DATA,
                    Stage::Smooth,
                    "not enough buckets for a moving average",
                )
                .with_field("stream", window.stream())
                .with_field("requested", requested)
                .with_field("smoothing_window", smoothing_window)
                .with_field("window_len", window.len()),
            );
            return Err(err);
        }
    };

    if plan.truncated {
        sink.record(
            LogEvent::warn(
                event_names::SMOOTH_DURATION_TRUNCATED,
                Stage::Smooth,
                "duration too long for the retained buckets, shortened",
            )
            .with_field("stream", window.stream())
            .with_field("requested", plan.requested)
            .with_field("effective", plan.duration)
            .with_field("smoothing_window", plan.smoothing_window),
        );
    }

    let completed: Vec<&Interval> = window
        .completed_newest_first()
        .take(plan.series_len())
        .collect();
    let series: Vec<u64> = completed
        .iter()
        .map(|bucket| match filter {
            Some(f) => f.count(bucket),
            None => bucket.event_count(),
        })
        .collect();

    let points = trailing_moving_average(&series, plan.smoothing_window)
        .into_iter()
        .zip(completed.iter().map(|bucket| bucket.start()))
        .take(plan.duration)
        .map(|(value, time)| AveragePoint { value, time })
        .collect();
    Ok(points)
}
