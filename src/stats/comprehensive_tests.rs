//! Property tests for the latency and throughput statistics

use super::*;
use proptest::prelude::*;

fn probe_values() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..10_000, 5)
}

proptest! {
    #[test]
    fn trimmed_set_is_the_three_middle_values(values in probe_values()) {
        let as_f64: Vec<f64> = values.iter().map(|&v| v as f64).collect();

        let mut sorted = as_f64.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        prop_assert_eq!(trimmed(&as_f64), sorted[1..4].to_vec());
    }

    #[test]
    fn summary_matches_manual_trimmed_statistics(values in probe_values()) {
        let samples: Vec<ProbeSample> = values.iter().map(|&v| ProbeSample::from_millis(v as f64)).collect();

        let mut sorted: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let middle = &sorted[1..4];
        let expected_avg = (middle[0] + middle[1] + middle[2]) / 3.0;
        let expected_jitter = middle.iter().map(|v| (v - expected_avg).abs()).sum::<f64>() / 3.0;

        let result = summarize_latency(&samples);

        prop_assert_eq!(result.average_ms, expected_avg.round() as u64);
        prop_assert_eq!(result.jitter_ms, expected_jitter.round() as u64);
    }

    #[test]
    fn summary_ignores_sample_order(mut values in probe_values()) {
        let forward: Vec<ProbeSample> = values.iter().map(|&v| ProbeSample::from_millis(v as f64)).collect();
        values.reverse();
        let backward: Vec<ProbeSample> = values.iter().map(|&v| ProbeSample::from_millis(v as f64)).collect();

        prop_assert_eq!(summarize_latency(&forward), summarize_latency(&backward));
    }

    #[test]
    fn jitter_is_never_negative(values in prop::collection::vec(0.0f64..1e6, 0..12)) {
        let retained = trimmed(&values);
        let jitter = mean_absolute_deviation(&retained, mean(&retained));
        prop_assert!(jitter >= 0.0);
    }

    #[test]
    fn rate_matches_formula(bytes in 1u64..1_000_000_000, millis in 1u64..120_000) {
        let elapsed = Duration::from_millis(millis);
        let expected = bytes as f64 / (1024.0 * 1024.0) / elapsed.as_secs_f64();

        let rate = rate_mbps(bytes, elapsed);

        prop_assert!((rate - expected).abs() <= 0.005 + 1e-9);
    }
}
