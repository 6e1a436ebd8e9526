//! View and demo ingestion.
//!
//! A user exists from their first view. Their attribute flags are captured
//! then and never change; later views only add counts. A demo is attributed
//! to the stored flags, at most once per user.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dt_common::{AttributeKey, Error, Result, UserId};
use serde::{Deserialize, Serialize};

use crate::logging::{event_names, DiagnosticSink, LogEvent, Stage};
use crate::window::{IntervalWindow, RotationStats};

/// Boolean attribute flags attached to a user.
pub type Attributes = HashMap<AttributeKey, bool>;

/// Build an attribute map from literal pairs.
pub fn attributes<'a>(pairs: impl IntoIterator<Item = (&'a str, bool)>) -> Attributes {
    pairs
        .into_iter()
        .map(|(k, v)| (AttributeKey::new(k), v))
        .collect()
}

/// Everything known about one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub attrs: Attributes,
    pub got_demo: bool,
}

/// Result of a demo booking that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoOutcome {
    /// Counted in the demos window.
    Recorded,
    /// The user had already booked; nothing changed.
    AlreadyProcessed,
}

/// Users seen so far. Records are never evicted.
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    users: HashMap<UserId, UserRecord>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str) -> Option<&UserRecord> {
        self.users.get(user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn demo_count(&self) -> usize {
        self.users.values().filter(|u| u.got_demo).count()
    }

    /// Return the user's record, creating it with `attrs` when unseen.
    /// The bool is true when the record was created.
    fn upsert(&mut self, user_id: &UserId, attrs: Attributes) -> (&UserRecord, bool) {
        let mut created = false;
        let record = self.users.entry(user_id.clone()).or_insert_with(|| {
            created = true;
            UserRecord {
                user_id: user_id.clone(),
                attrs,
                got_demo: false,
            }
        });
        (record, created)
    }
}

/// Record a view at `now`.
///
/// The view is counted with the user's stored flags, which are the ones
/// passed on their first view.
pub fn ingest_view(
    registry: &mut UserRegistry,
    views: &mut IntervalWindow,
    now: DateTime<Utc>,
    user_id: &UserId,
    attrs: Attributes,
    sink: &dyn DiagnosticSink,
) -> RotationStats {
    let (record, created) = registry.upsert(user_id, attrs);
    if created {
        sink.record(
            LogEvent::debug(
                event_names::INGEST_USER_CREATED,
                Stage::Ingest,
                "new user registered",
            )
            .with_field("user_id", user_id.as_str())
            .with_field("attr_count", record.attrs.len()),
        );
    }

    let stats = views.rotate(now);
    if let Some(bucket) = views.in_progress_mut() {
        bucket.record(&record.attrs);
    }

    sink.record(
        LogEvent::trace(event_names::INGEST_VIEW_RECORDED, Stage::Ingest, "view recorded")
            .with_field("user_id", user_id.as_str()),
    );
    stats
}

/// Record a demo booking at `now`.
///
/// Fails with `UserNotFound` when the user never viewed. A second booking
/// by the same user is reported as `AlreadyProcessed` and changes nothing.
pub fn ingest_demo(
    registry: &mut UserRegistry,
    demos: &mut IntervalWindow,
    now: DateTime<Utc>,
    user_id: &UserId,
    sink: &dyn DiagnosticSink,
) -> Result<(DemoOutcome, RotationStats)> {
    let Some(record) = registry.users.get_mut(user_id.as_str()) else {
        sink.record(
            LogEvent::error(
                event_names::INGEST_USER_NOT_FOUND,
                Stage::Ingest,
                "demo booked by a user with no recorded view",
            )
            .with_field("user_id", user_id.as_str()),
        );
        return Err(Error::UserNotFound {
            user_id: user_id.to_string(),
        });
    };

    if record.got_demo {
        sink.record(
            LogEvent::info(
                event_names::INGEST_DEMO_ALREADY_PROCESSED,
                Stage::Ingest,
                "demo already recorded for user",
            )
            .with_field("user_id", user_id.as_str()),
        );
        return Ok((DemoOutcome::AlreadyProcessed, RotationStats::default()));
    }

    let stats = demos.rotate(now);
    if let Some(bucket) = demos.in_progress_mut() {
        bucket.record(&record.attrs);
    }
    record.got_demo = true;

    sink.record(
        LogEvent::debug(
            event_names::INGEST_DEMO_RECORDED,
            Stage::Ingest,
            "demo recorded",
        )
        .with_field("user_id", user_id.as_str()),
    );
    Ok((DemoOutcome::Recorded, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::window::Stream;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()
    }

    fn windows() -> (IntervalWindow, IntervalWindow) {
        (
            IntervalWindow::new(Stream::Views, 3_600, 24),
            IntervalWindow::new(Stream::Demos, 3_600, 24),
        )
    }

    #[test]
    fn test_first_view_creates_user() {
        let mut registry = UserRegistry::new();
        let (mut views, _) = windows();
        let sink = MemorySink::new();
        let user = UserId::new("u1");

        ingest_view(
            &mut registry,
            &mut views,
            now(),
            &user,
            attributes([("mobile", true), ("paid", false)]),
            &sink,
        );

        let record = registry.get("u1").unwrap();
        assert!(!record.got_demo);
        assert_eq!(record.attrs.len(), 2);
        assert_eq!(views.len(), 25);
        assert_eq!(views.in_progress().unwrap().event_count(), 1);
        assert_eq!(views.in_progress().unwrap().true_count("mobile"), 1);
        assert_eq!(sink.count(event_names::INGEST_USER_CREATED), 1);
    }

    #[test]
    fn test_repeat_view_keeps_first_attrs() {
        let mut registry = UserRegistry::new();
        let (mut views, _) = windows();
        let sink = MemorySink::new();
        let user = UserId::new("u1");

        ingest_view(&mut registry, &mut views, now(), &user, attributes([("mobile", true)]), &sink);
        ingest_view(&mut registry, &mut views, now(), &user, attributes([("mobile", false), ("paid", true)]), &sink);

        let record = registry.get("u1").unwrap();
        assert_eq!(record.attrs, attributes([("mobile", true)]));
        let bucket = views.in_progress().unwrap();
        assert_eq!(bucket.event_count(), 2);
        assert_eq!(bucket.true_count("mobile"), 2);
        assert_eq!(bucket.true_count("paid"), 0);
        assert_eq!(sink.count(event_names::INGEST_USER_CREATED), 1);
    }

    #[test]
    fn test_demo_without_view_is_not_found() {
        let mut registry = UserRegistry::new();
        let (_, mut demos) = windows();
        let sink = MemorySink::new();

        let err = ingest_demo(&mut registry, &mut demos, now(), &UserId::new("ghost"), &sink)
            .unwrap_err();
        assert!(matches!(err, Error::UserNotFound { ref user_id } if user_id == "ghost"));
        assert!(demos.is_empty());

        let event = sink.last(event_names::INGEST_USER_NOT_FOUND).unwrap();
        assert_eq!(event.level, crate::logging::Level::Error);
        assert_eq!(event.field("user_id"), Some(&serde_json::json!("ghost")));
    }

    #[test]
    fn test_demo_uses_stored_attrs_once() {
        let mut registry = UserRegistry::new();
        let (mut views, mut demos) = windows();
        let sink = MemorySink::new();
        let user = UserId::new("u1");

        ingest_view(&mut registry, &mut views, now(), &user, attributes([("mobile", true)]), &sink);

        let (outcome, _) = ingest_demo(&mut registry, &mut demos, now(), &user, &sink).unwrap();
        assert_eq!(outcome, DemoOutcome::Recorded);
        assert!(registry.get("u1").unwrap().got_demo);
        assert_eq!(demos.in_progress().unwrap().event_count(), 1);
        assert_eq!(demos.in_progress().unwrap().true_count("mobile"), 1);

        let (outcome, stats) = ingest_demo(&mut registry, &mut demos, now(), &user, &sink).unwrap();
        assert_eq!(outcome, DemoOutcome::AlreadyProcessed);
        assert!(!stats.changed());
        assert_eq!(demos.in_progress().unwrap().event_count(), 1);
        assert_eq!(sink.count(event_names::INGEST_DEMO_ALREADY_PROCESSED), 1);
        assert_eq!(registry.demo_count(), 1);
    }
}
