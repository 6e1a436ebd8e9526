//! Single-feature conditional probabilities via Bayes' rule.
//!
//! For a boolean attribute `A` and the event `D` ("booked a demo"):
//!
//! ```text
//! P(D | A=a) = P(D) · P(A=a | D) / P(A=a)
//! ```
//!
//! with every term estimated from raw counts:
//! - `P(A=true)     = true_views / total_views`
//! - `P(D)          = total_demos / total_views`
//! - `P(A=true | D) = true_demos / total_demos`
//!
//! The `false` branch uses the complements `1 - P(A=true)` and
//! `1 - P(A=true | D)`. A branch whose denominator is zero has no posterior.

use serde::{Deserialize, Serialize};

/// Raw counts for one attribute over a view stream and a demo stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeCounts {
    /// Views where the attribute was true.
    pub true_views: u64,
    /// All views.
    pub total_views: u64,
    /// Demos where the attribute was true.
    pub true_demos: u64,
    /// All demos.
    pub total_demos: u64,
}

/// Posterior demo probability for each value of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BranchPosteriors {
    /// `P(D | A=true)`, None when `P(A=true) == 0`.
    pub when_true: Option<f64>,
    /// `P(D | A=false)`, None when `P(A=false) == 0`.
    pub when_false: Option<f64>,
}

/// `numerator / denominator`, or None for a zero denominator.
pub fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64)
}

/// Bayes' rule: `prior · likelihood / evidence`.
///
/// Returns None when `evidence` is zero or any input is not finite.
pub fn bayes_posterior(prior: f64, likelihood: f64, evidence: f64) -> Option<f64> {
    if !prior.is_finite() || !likelihood.is_finite() || !evidence.is_finite() {
        return None;
    }
    if evidence == 0.0 {
        return None;
    }
    Some(prior * likelihood / evidence)
}

/// Compute both branch posteriors for one attribute.
///
/// Returns None when either stream total is zero, since no conversion rate
/// can be estimated.
///
/// # Example
/// ```
/// use dt_math::{attribute_posteriors, AttributeCounts};
///
/// let counts = AttributeCounts { true_views: 50, total_views: 100, true_demos: 40, total_demos: 50 };
/// let post = attribute_posteriors(&counts).unwrap();
/// assert!((post.when_true.unwrap() - 0.8).abs() < 1e-12);
/// ```
pub fn attribute_posteriors(counts: &AttributeCounts) -> Option<BranchPosteriors> {
    let p_true = ratio(counts.true_views, counts.total_views)?;
    let p_demo = ratio(counts.total_demos, counts.total_views)?;
    let p_true_given_demo = ratio(counts.true_demos, counts.total_demos)?;

    let p_false = 1.0 - p_true;
    let p_false_given_demo = 1.0 - p_true_given_demo;

    Some(BranchPosteriors {
        when_true: bayes_posterior(p_demo, p_true_given_demo, p_true),
        when_false: bayes_posterior(p_demo, p_false_given_demo, p_false),
    })
}
