//! Read-only analytics over rotated windows.
//!
//! Every function here reads completed buckets only. Rotating the windows to
//! `now` first is the caller's job (see `Store`).

pub mod aggregate;
pub mod moving_average;
pub mod predictor;

pub use aggregate::{last_24h_total, StreamTotals};
pub use moving_average::{moving_average, plan_duration, AttributeFilter, AveragePoint, SmoothingPlan};
pub use predictor::{best_predictor, rank_predictors, Prediction};
