//! Property-based tests for window rotation.
//!
//! Checks the length, contiguity, alignment, idempotence and sum invariants
//! over random clock walks.

use chrono::{DateTime, TimeDelta, Utc};
use dt_core::window::{align_to_bucket, Interval, IntervalWindow, Stream};
use dt_core::{attributes, logging::NullSink, ManualClock, Store};
use dt_config::TrackerConfig;
use proptest::prelude::*;
use std::sync::Arc;

fn instant(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn starts(w: &IntervalWindow) -> Vec<DateTime<Utc>> {
    w.buckets().map(Interval::start).collect()
}

/// 2020-01-01 .. 2030-01-01 in seconds.
fn epoch_range() -> std::ops::Range<i64> {
    1_577_836_800..1_893_456_000
}

fn bucket_secs() -> impl Strategy<Value = u64> {
    prop::sample::select(vec![60u64, 300, 900, 3_600, 7_200, 86_400])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// After any sequence of forward rotations the window holds exactly
    /// retention + 1 contiguous, aligned buckets and the last contains `now`.
    #[test]
    fn rotation_shape(
        start in epoch_range(),
        steps in prop::collection::vec(0i64..200_000, 1..20),
        len in bucket_secs(),
        retention in 1usize..48,
    ) {
        let mut w = IntervalWindow::new(Stream::Views, len, retention);
        let mut now = start;
        for step in steps {
            now += step;
            w.rotate(instant(now));

            prop_assert_eq!(w.len(), retention + 1);
            let s = starts(&w);
            for pair in s.windows(2) {
                prop_assert_eq!(pair[1] - pair[0], TimeDelta::seconds(len as i64));
            }
            for t in &s {
                prop_assert_eq!(t.timestamp().rem_euclid(len as i64), 0);
            }
            prop_assert!(w.in_progress().unwrap().contains(instant(now)));
        }
    }

    /// Rotating twice to the same instant changes nothing.
    #[test]
    fn rotation_idempotent(
        first in epoch_range(),
        gap in 0i64..1_000_000,
        len in bucket_secs(),
        retention in 1usize..48,
    ) {
        let mut w = IntervalWindow::new(Stream::Demos, len, retention);
        w.rotate(instant(first));
        w.rotate(instant(first + gap));
        let before = starts(&w);
        let stats = w.rotate(instant(first + gap));
        prop_assert!(!stats.changed());
        prop_assert_eq!(before, starts(&w));
    }

    /// Two windows converge on the same buckets no matter when they began.
    #[test]
    fn alignment_independent_of_history(
        a in epoch_range(),
        offset in 0i64..500_000,
        lead in 0i64..500_000,
        len in bucket_secs(),
        retention in 1usize..48,
    ) {
        let mut wa = IntervalWindow::new(Stream::Views, len, retention);
        let mut wb = IntervalWindow::new(Stream::Views, len, retention);
        wa.rotate(instant(a));
        wb.rotate(instant(a + offset));
        let target = a + offset + lead;
        wa.rotate(instant(target));
        wb.rotate(instant(target));
        prop_assert_eq!(starts(&wa), starts(&wb));
    }

    /// Going back in time never alters the window.
    #[test]
    fn clock_going_backwards_is_ignored(
        now in epoch_range(),
        back in 1i64..1_000_000,
        len in bucket_secs(),
    ) {
        let mut w = IntervalWindow::new(Stream::Views, len, 24);
        w.rotate(instant(now));
        let before = starts(&w);
        let earlier = instant(now - back);
        let stats = w.rotate(earlier);
        if align_to_bucket(earlier, TimeDelta::seconds(len as i64)) < before[before.len() - 1] {
            prop_assert!(stats.clock_behind);
        }
        prop_assert_eq!(before, starts(&w));
    }

    /// k views in every hour give k * 24 over the last day.
    #[test]
    fn constant_rate_sum(k in 0u64..6, hours in 24usize..40) {
        let clock = Arc::new(ManualClock::new(instant(1_717_200_000)));
        let mut store = Store::new(TrackerConfig::default())
            .unwrap()
            .with_clock(clock.clone())
            .with_sink(Arc::new(NullSink));
        let mut n = 0;
        for _ in 0..hours {
            for _ in 0..k {
                n += 1;
                store.track_view(format!("u{n}"), attributes([]));
            }
            clock.advance(TimeDelta::hours(1));
        }
        prop_assert_eq!(store.get_views_last_24hr(), k * 24);
    }

    /// Constant bucket counts smooth to the same constant.
    #[test]
    fn constant_series_constant_average(k in 1u64..5, duration in 1usize..19) {
        let clock = Arc::new(ManualClock::new(instant(1_717_200_000)));
        let mut store = Store::new(TrackerConfig::default())
            .unwrap()
            .with_clock(clock.clone())
            .with_sink(Arc::new(NullSink));
        let mut n = 0;
        for _ in 0..30 {
            for _ in 0..k {
                n += 1;
                store.track_view(format!("u{n}"), attributes([]));
            }
            clock.advance(TimeDelta::hours(1));
        }
        let points = store.moving_average_views(duration).unwrap();
        prop_assert_eq!(points.len(), duration);
        for p in points {
            prop_assert_eq!(p.value, k as f64);
        }
    }
}
