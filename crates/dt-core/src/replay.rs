//! Offline replay of a JSONL event log.
//!
//! Each non-empty line is one event:
//!
//! ```json
//! {"ts":"2024-05-01T10:15:00Z","kind":"view","user_id":"u1","attrs":{"mobile":true}}
//! {"ts":"2024-05-01T10:20:00Z","kind":"demo","user_id":"u1"}
//! ```
//!
//! Lines starting with `#` are comments. Events are applied in file order
//! to a fresh store whose clock is set to each event's timestamp, then every
//! analytic is evaluated at a single instant.

use std::io::BufRead;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dt_common::{Error, Result, StructuredError, UserId};
use dt_config::TrackerConfig;
use serde::{Deserialize, Serialize};

use crate::analytics::{AttributeFilter, AveragePoint, Prediction};
use crate::clock::ManualClock;
use crate::ingest::{Attributes, DemoOutcome};
use crate::logging::{event_names, DiagnosticSink, LogEvent, Stage};
use crate::store::{Store, TrackerSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    View,
    Demo,
}

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEvent {
    pub ts: DateTime<Utc>,
    pub kind: EventKind,
    pub user_id: UserId,
    #[serde(default)]
    pub attrs: Attributes,
}

/// An event with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEvent {
    pub line: usize,
    pub event: TrackedEvent,
}

/// Parse a JSONL event log. The first malformed line aborts the parse.
pub fn parse_events<R: BufRead>(reader: R) -> Result<Vec<LoggedEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: TrackedEvent =
            serde_json::from_str(trimmed).map_err(|e| Error::InvalidEvent {
                line: line_no,
                message: e.to_string(),
            })?;
        events.push(LoggedEvent {
            line: line_no,
            event,
        });
    }
    Ok(events)
}

/// What to compute once the log has been applied.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Points per moving average.
    pub duration: usize,
    /// Extra filtered moving average over views.
    pub query: Option<AttributeFilter>,
    /// Evaluation instant; defaults to the latest event timestamp. Must not
    /// precede any event.
    pub at: Option<DateTime<Utc>>,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        ReplayOptions {
            duration: 3,
            query: None,
            at: None,
        }
    }
}

/// Either a value or the error the query produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome<T> {
    Ok(T),
    Error(StructuredError),
}

impl<T> QueryOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, QueryOutcome::Ok(_))
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            QueryOutcome::Ok(v) => Some(v),
            QueryOutcome::Error(_) => None,
        }
    }
}

impl<T> From<Result<T>> for QueryOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(v) => QueryOutcome::Ok(v),
            Err(e) => QueryOutcome::Error(StructuredError::from(&e)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestCounts {
    pub views: usize,
    pub demos_recorded: usize,
    pub demos_already_processed: usize,
    pub demos_rejected: usize,
}

/// Everything a replay produces.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub evaluated_at: DateTime<Utc>,
    pub ingested: IngestCounts,
    pub summary: TrackerSummary,
    pub moving_average_views: QueryOutcome<Vec<AveragePoint>>,
    pub moving_average_demos: QueryOutcome<Vec<AveragePoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving_average_query: Option<QueryOutcome<Vec<AveragePoint>>>,
    pub predictor: QueryOutcome<Prediction>,
    pub ranked_predictors: QueryOutcome<Vec<Prediction>>,
}

impl ReplayReport {
    /// True when the predictor found nothing to rank.
    pub fn no_signal(&self) -> bool {
        !self.predictor.is_ok()
    }
}

/// Apply `events` to a fresh store and evaluate every analytic.
pub fn replay(
    config: &TrackerConfig,
    events: &[LoggedEvent],
    options: &ReplayOptions,
    sink: Arc<dyn DiagnosticSink>,
) -> Result<ReplayReport> {
    let latest = events.iter().max_by_key(|e| e.event.ts);
    if let (Some(at), Some(latest)) = (options.at, latest) {
        if at < latest.event.ts {
            return Err(Error::InvalidEvent {
                line: latest.line,
                message: format!(
                    "event at {} is later than the evaluation instant {}",
                    latest.event.ts.to_rfc3339(),
                    at.to_rfc3339()
                ),
            });
        }
    }
    let evaluated_at = options
        .at
        .or(latest.map(|e| e.event.ts))
        .unwrap_or_else(Utc::now);
    let start = events.first().map(|e| e.event.ts).unwrap_or(evaluated_at);

    let clock = Arc::new(ManualClock::new(start));
    let mut store = Store::new(config.clone())?
        .with_clock(clock.clone())
        .with_sink(sink.clone());

    let mut ingested = IngestCounts::default();
    for logged in events {
        clock.set(logged.event.ts);
        let user_id = logged.event.user_id.clone();
        match logged.event.kind {
            EventKind::View => {
                store.track_view(user_id, logged.event.attrs.clone());
                ingested.views += 1;
            }
            EventKind::Demo => match store.track_book_demo(user_id) {
                Ok(DemoOutcome::Recorded) => ingested.demos_recorded += 1,
                Ok(DemoOutcome::AlreadyProcessed) => ingested.demos_already_processed += 1,
                Err(err) => {
                    ingested.demos_rejected += 1;
                    sink.record(
                        LogEvent::warn(
                            event_names::REPLAY_EVENT_REJECTED,
                            Stage::Replay,
                            "event rejected",
                        )
                        .with_field("line", logged.line)
                        .with_field("code", err.code())
                        .with_field("reason", err.to_string()),
                    );
                }
            },
        }
    }

    clock.set(evaluated_at);
    let moving_average_query = options.query.as_ref().map(|filter| {
        store
            .moving_average_views_by_query(options.duration, filter.key.clone(), filter.value)
            .into()
    });

    Ok(ReplayReport {
        evaluated_at,
        moving_average_views: store.moving_average_views(options.duration).into(),
        moving_average_demos: store.moving_average_demos(options.duration).into(),
        moving_average_query,
        predictor: store.get_predictor().into(),
        ranked_predictors: store.rank_predictors().into(),
        summary: store.summary(),
        ingested,
    })
}
