//! In-memory tracker store.
//!
//! `Store` owns the user registry and the two windows. Every operation has
//! an `_at(now)` form taking the instant explicitly; the plain form asks the
//! injected clock. Mutating operations take `&mut self`; wrap the store in a
//! `Mutex` to share it between threads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dt_common::{AttributeKey, Error, Result, UserId};
use dt_config::{validate_tracker_config, TrackerConfig};
use serde::Serialize;

use crate::analytics::{self, AttributeFilter, AveragePoint, Prediction};
use crate::clock::{Clock, SystemClock};
use crate::ingest::{self, Attributes, DemoOutcome, UserRecord, UserRegistry};
use crate::logging::{event_names, DiagnosticSink, LogEvent, Stage, TracingSink};
use crate::window::{IntervalWindow, RotationStats, Stream};

/// Point-in-time overview of the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerSummary {
    pub at: DateTime<Utc>,
    pub users: usize,
    pub demos_booked: usize,
    pub views_last_24hr: u64,
    pub demos_last_24hr: u64,
    pub views_buckets: usize,
    pub demos_buckets: usize,
    pub bucket_length_secs: u64,
    pub retention_count: usize,
    pub smoothing_window: usize,
}

pub struct Store {
    config: TrackerConfig,
    users: UserRegistry,
    views: IntervalWindow,
    demos: IntervalWindow,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("users", &self.users.len())
            .field("views", &self.views.len())
            .field("demos", &self.demos.len())
            .finish_non_exhaustive()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::with_valid_config(TrackerConfig::default())
    }
}

impl Store {
    /// Store over a validated config, using the wall clock and `tracing`.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        validate_tracker_config(&config).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: TrackerConfig) -> Self {
        Store {
            views: IntervalWindow::from_config(Stream::Views, &config),
            demos: IntervalWindow::from_config(Stream::Demos, &config),
            users: UserRegistry::new(),
            config,
            clock: Arc::new(SystemClock),
            sink: Arc::new(TracingSink::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn views(&self) -> &IntervalWindow {
        &self.views
    }

    pub fn demos(&self) -> &IntervalWindow {
        &self.demos
    }

    pub fn user(&self, user_id: &str) -> Option<&UserRecord> {
        self.users.get(user_id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn log_rotation(&self, stream: Stream, stats: RotationStats, now: DateTime<Utc>) {
        if stats.clock_behind {
            self.sink.record(
                LogEvent::warn(
                    event_names::ROTATE_CLOCK_BEHIND,
                    Stage::Rotate,
                    "clock is behind the newest bucket, window left unchanged",
                )
                .with_field("stream", stream)
                .with_field("now", now),
            );
        } else if stats.changed() {
            self.sink.record(
                LogEvent::debug(event_names::ROTATE_APPLIED, Stage::Rotate, "window rotated")
                    .with_field("stream", stream)
                    .with_field("evicted", stats.evicted)
                    .with_field("appended", stats.appended),
            );
        }
    }

    fn rotate(&mut self, stream: Stream, now: DateTime<Utc>) {
        let stats = match stream {
            Stream::Views => self.views.rotate(now),
            Stream::Demos => self.demos.rotate(now),
        };
        self.log_rotation(stream, stats, now);
    }

    // ---- ingestion ----

    /// Record a view. A user's attribute flags are fixed by their first view.
    pub fn track_view(&mut self, user_id: impl Into<UserId>, attrs: Attributes) {
        let now = self.now();
        self.track_view_at(now, user_id, attrs);
    }

    pub fn track_view_at(
        &mut self,
        now: DateTime<Utc>,
        user_id: impl Into<UserId>,
        attrs: Attributes,
    ) {
        let user_id = user_id.into();
        let stats = ingest::ingest_view(
            &mut self.users,
            &mut self.views,
            now,
            &user_id,
            attrs,
            self.sink.as_ref(),
        );
        self.log_rotation(Stream::Views, stats, now);
    }

    /// Record a demo booking for a user who has viewed.
    pub fn track_book_demo(&mut self, user_id: impl Into<UserId>) -> Result<DemoOutcome> {
        let now = self.now();
        self.track_book_demo_at(now, user_id)
    }

    pub fn track_book_demo_at(
        &mut self,
        now: DateTime<Utc>,
        user_id: impl Into<UserId>,
    ) -> Result<DemoOutcome> {
        let user_id = user_id.into();
        let (outcome, stats) = ingest::ingest_demo(
            &mut self.users,
            &mut self.demos,
            now,
            &user_id,
            self.sink.as_ref(),
        )?;
        self.log_rotation(Stream::Demos, stats, now);
        Ok(outcome)
    }

    // ---- 24 hour totals ----

    pub fn get_views_last_24hr(&mut self) -> u64 {
        let now = self.now();
        self.get_views_last_24hr_at(now)
    }

    pub fn get_views_last_24hr_at(&mut self, now: DateTime<Utc>) -> u64 {
        self.rotate(Stream::Views, now);
        analytics::last_24h_total(&self.views)
    }

    pub fn get_demos_last_24hr(&mut self) -> u64 {
        let now = self.now();
        self.get_demos_last_24hr_at(now)
    }

    pub fn get_demos_last_24hr_at(&mut self, now: DateTime<Utc>) -> u64 {
        self.rotate(Stream::Demos, now);
        analytics::last_24h_total(&self.demos)
    }

    // ---- moving averages ----

    fn moving_average_at(
        &mut self,
        stream: Stream,
        now: DateTime<Utc>,
        duration: usize,
        filter: Option<&AttributeFilter>,
    ) -> Result<Vec<AveragePoint>> {
        self.rotate(stream, now);
        let window = match stream {
            Stream::Views => &self.views,
            Stream::Demos => &self.demos,
        };
        analytics::moving_average(
            window,
            duration,
            self.config.smoothing_window,
            filter,
            self.sink.as_ref(),
        )
    }

    /// Smoothed views, newest point first.
    pub fn moving_average_views(&mut self, duration: usize) -> Result<Vec<AveragePoint>> {
        let now = self.now();
        self.moving_average_views_at(now, duration)
    }

    pub fn moving_average_views_at(
        &mut self,
        now: DateTime<Utc>,
        duration: usize,
    ) -> Result<Vec<AveragePoint>> {
        self.moving_average_at(Stream::Views, now, duration, None)
    }

    /// Smoothed views restricted to users whose `key` flag equals `value`.
    pub fn moving_average_views_by_query(
        &mut self,
        duration: usize,
        key: impl Into<AttributeKey>,
        value: bool,
    ) -> Result<Vec<AveragePoint>> {
        let now = self.now();
        self.moving_average_views_by_query_at(now, duration, key, value)
    }

    pub fn moving_average_views_by_query_at(
        &mut self,
        now: DateTime<Utc>,
        duration: usize,
        key: impl Into<AttributeKey>,
        value: bool,
    ) -> Result<Vec<AveragePoint>> {
        let filter = AttributeFilter::new(key, value);
        self.moving_average_at(Stream::Views, now, duration, Some(&filter))
    }

    /// Smoothed demo bookings, newest point first.
    pub fn moving_average_demos(&mut self, duration: usize) -> Result<Vec<AveragePoint>> {
        let now = self.now();
        self.moving_average_demos_at(now, duration)
    }

    pub fn moving_average_demos_at(
        &mut self,
        now: DateTime<Utc>,
        duration: usize,
    ) -> Result<Vec<AveragePoint>> {
        self.moving_average_at(Stream::Demos, now, duration, None)
    }

    // ---- predictor ----

    /// The attribute value with the highest posterior demo probability.
    pub fn get_predictor(&mut self) -> Result<Prediction> {
        let now = self.now();
        self.get_predictor_at(now)
    }

    pub fn get_predictor_at(&mut self, now: DateTime<Utc>) -> Result<Prediction> {
        self.rotate(Stream::Views, now);
        self.rotate(Stream::Demos, now);
        analytics::best_predictor(&self.views, &self.demos, self.sink.as_ref())
    }

    /// All attribute values, highest posterior first.
    pub fn rank_predictors(&mut self) -> Result<Vec<Prediction>> {
        let now = self.now();
        self.rank_predictors_at(now)
    }

    pub fn rank_predictors_at(&mut self, now: DateTime<Utc>) -> Result<Vec<Prediction>> {
        self.rotate(Stream::Views, now);
        self.rotate(Stream::Demos, now);
        analytics::rank_predictors(&self.views, &self.demos, self.sink.as_ref())
    }

    // ---- summary ----

    pub fn summary(&mut self) -> TrackerSummary {
        let now = self.now();
        self.summary_at(now)
    }

    pub fn summary_at(&mut self, now: DateTime<Utc>) -> TrackerSummary {
        let views_last_24hr = self.get_views_last_24hr_at(now);
        let demos_last_24hr = self.get_demos_last_24hr_at(now);
        TrackerSummary {
            at: now,
            users: self.users.len(),
            demos_booked: self.users.demo_count(),
            views_last_24hr,
            demos_last_24hr,
            views_buckets: self.views.len(),
            demos_buckets: self.demos.len(),
            bucket_length_secs: self.config.bucket_length_secs,
            retention_count: self.config.retention_count,
            smoothing_window: self.config.smoothing_window,
        }
    }
}
