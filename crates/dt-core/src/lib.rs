//! Demo Tracker core library.
//!
//! - `window`: epoch-aligned rotating interval windows
//! - `ingest`: view and demo ingestion over a user registry
//! - `analytics`: 24-hour totals, moving averages and the conversion predictor
//! - `store`: the facade tying them together behind an injected clock and sink
//! - `replay`: offline evaluation of a JSONL event log
//! - `logging`, `exit_codes`: ambient support for the `dt-core` binary
//!
//! The binary entry point is in `main.rs`.

pub mod analytics;
pub mod clock;
pub mod exit_codes;
pub mod ingest;
pub mod logging;
pub mod replay;
pub mod store;
pub mod window;

pub use analytics::{AttributeFilter, AveragePoint, Prediction};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ingest::{attributes, Attributes, DemoOutcome, UserRecord};
pub use store::{Store, TrackerSummary};
pub use window::{Interval, IntervalWindow, Stream};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_log;
