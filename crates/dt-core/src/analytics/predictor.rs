//! Single-feature conversion predictor.
//!
//! For every attribute seen as true among completed views, estimate
//! `P(demo | attr = true)` and `P(demo | attr = false)` by Bayes' rule from
//! the completed-bucket totals of both windows, then rank all estimates.

use dt_common::{AttributeKey, Error, Result};
use dt_math::{attribute_posteriors, AttributeCounts};
use serde::{Deserialize, Serialize};

use super::aggregate::StreamTotals;
use crate::logging::{event_names, DiagnosticSink, LogEvent, Stage};
use crate::window::IntervalWindow;

/// Posterior demo probability for one attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub key: AttributeKey,
    pub value: bool,
    pub probability: f64,
}

fn no_signal(views: &StreamTotals, demos: &StreamTotals, sink: &dyn DiagnosticSink) -> Error {
    sink.record(
        LogEvent::warn(
            event_names::PREDICT_NO_SIGNAL,
            Stage::Predict,
            "no predictive signal in completed buckets",
        )
        .with_field("total_views", views.total)
        .with_field("total_demos", demos.total),
    );
    Error::NoSignal {
        total_views: views.total,
        total_demos: demos.total,
    }
}

/// Every computable posterior, highest first.
///
/// The sort is stable, but attribute order before sorting carries no
/// meaning, so equal probabilities come out in no particular order.
pub fn rank_predictors(
    views: &IntervalWindow,
    demos: &IntervalWindow,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<Prediction>> {
    let view_totals = StreamTotals::from_completed(views);
    let demo_totals = StreamTotals::from_completed(demos);

    if view_totals.total == 0 || demo_totals.total == 0 {
        return Err(no_signal(&view_totals, &demo_totals, sink));
    }

    let mut ranked = Vec::with_capacity(view_totals.true_counts.len() * 2);
    for (key, &true_views) in &view_totals.true_counts {
        let counts = AttributeCounts {
            true_views,
            total_views: view_totals.total,
            true_demos: demo_totals.true_count(key.as_str()),
            total_demos: demo_totals.total,
        };
        let Some(branches) = attribute_posteriors(&counts) else {
            continue;
        };

        for (value, posterior) in [(true, branches.when_true), (false, branches.when_false)] {
            match posterior {
                Some(probability) => ranked.push(Prediction {
                    key: key.clone(),
                    value,
                    probability,
                }),
                None => sink.record(
                    LogEvent::debug(
                        event_names::PREDICT_BRANCH_SKIPPED,
                        Stage::Predict,
                        "attribute value never observed, posterior undefined",
                    )
                    .with_field("key", key)
                    .with_field("value", value)
                    .with_field("true_views", true_views)
                    .with_field("total_views", view_totals.total),
                ),
            }
        }
    }

    if ranked.is_empty() {
        return Err(no_signal(&view_totals, &demo_totals, sink));
    }

    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));

    sink.record(
        LogEvent::debug(event_names::PREDICT_RANKED, Stage::Predict, "predictors ranked")
            .with_field("candidates", ranked.len())
            .with_field("best_key", &ranked[0].key)
            .with_field("best_value", ranked[0].value)
            .with_field("best_probability", ranked[0].probability),
    );
    Ok(ranked)
}

/// The single highest posterior.
pub fn best_predictor(
    views: &IntervalWindow,
    demos: &IntervalWindow,
    sink: &dyn DiagnosticSink,
) -> Result<Prediction> {
    let ranked = rank_predictors(views, demos, sink)?;
    ranked.into_iter().next().ok_or(Error::NoSignal {
        total_views: 0,
        total_demos: 0,
    })
}
