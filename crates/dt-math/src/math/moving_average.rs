//! Trailing simple moving average over count series.
//!
//! The series is consumed in index order: the first average covers
//! `values[0..window]`, the next one drops `values[0]` and admits
//! `values[window]`, and so on. Callers that want newest-first output pass a
//! newest-first series.
//!
//! The running sum is maintained incrementally, so the whole pass is
//! O(values.len()) regardless of the window size.

/// Compute trailing simple moving averages of `values` with the given window.
///
/// Returns `values.len() - window + 1` averages. Returns an empty vector when
/// `window` is zero or larger than the series.
///
/// # Example
/// ```
/// use dt_math::trailing_moving_average;
///
/// let avgs = trailing_moving_average(&[1, 2, 3, 4], 2);
/// assert_eq!(avgs, vec![1.5, 2.5, 3.5]);
/// ```
pub fn trailing_moving_average(values: &[u64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }

    let divisor = window as f64;
    let mut averages = Vec::with_capacity(values.len() - window + 1);
    let mut sum: u64 = values[..window].iter().sum();
    averages.push(sum as f64 / divisor);

    for i in window..values.len() {
        sum -= values[i - window];
        sum += values[i];
        averages.push(sum as f64 / divisor);
    }

    averages
}

/// Number of series points needed to produce `outputs` averages.
///
/// Returns None when either argument is zero.
pub fn series_len_for(outputs: usize, window: usize) -> Option<usize> {
    if outputs == 0 || window == 0 {
        return None;
    }
    outputs.checked_add(window - 1)
}
