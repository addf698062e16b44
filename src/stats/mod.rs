//! Statistical helpers for latency and throughput figures
//!
//! Latency uses a trimmed mean: the single lowest and single highest sample
//! are discarded before averaging. Jitter is the mean absolute deviation of
//! the retained samples from their own mean.

use crate::models::metrics::{LatencyResult, ProbeSample};
use std::time::Duration;

/// Bytes in one megabyte as reported by the rate figures
pub const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Sort samples and drop the single lowest and highest value
///
/// With fewer than three samples nothing is dropped.
pub fn trimmed(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    if sorted.len() < 3 {
        return sorted;
    }

    sorted[1..sorted.len() - 1].to_vec()
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean absolute deviation of `values` from `center`
pub fn mean_absolute_deviation(values: &[f64], center: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| (v - center).abs()).sum::<f64>() / values.len() as f64
}

/// Round a non-negative millisecond figure to the nearest whole millisecond
pub fn round_ms(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round() as u64
}

/// Round to two decimal places
pub fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Trimmed average and jitter of a set of probe samples
pub fn summarize_latency(samples: &[ProbeSample]) -> LatencyResult {
    let values: Vec<f64> = samples.iter().map(|s| s.elapsed_ms).collect();
    let retained = trimmed(&values);
    let average = mean(&retained);
    let jitter = mean_absolute_deviation(&retained, average);

    LatencyResult {
        average_ms: round_ms(average),
        jitter_ms: round_ms(jitter),
        samples_sent: samples.len(),
        samples_failed: samples.iter().filter(|s| !s.responded).count(),
    }
}

/// Average transfer rate in MB/s, rounded to two decimals
///
/// A zero elapsed time yields 0 rather than an infinite rate.
pub fn rate_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        return 0.0;
    }
    round_two_decimals(bytes as f64 / BYTES_PER_MEGABYTE / seconds)
}

// Property-based tests live in a separate module
#[cfg(test)]
mod comprehensive_tests;
