//! Property-based tests for the health math and routing order
//!
//! These cover invariants that must hold for any probe history or any set of
//! executor latencies, not just the hand-picked cases in the unit tests.

use proptest::prelude::*;
use relay_core::config::{DegradationThresholds, HealthConfig};
use relay_core::constants::{DegradationLevel, TaskType};
use relay_core::health::{classify_record, compute_global_level, smoothed_error_rate, ServiceHealthRecord};
use relay_core::orchestration::latency_first;
use relay_core::registry::ExecutorDescriptor;

fn arb_record() -> impl Strategy<Value = ServiceHealthRecord> {
    ("[a-z]{1,8}", any::<bool>(), 0.0f64..=1.0, 0u64..10_000).prop_map(
        |(service, healthy, error_rate, latency)| {
            let mut record = ServiceHealthRecord::new(service);
            record.is_healthy = healthy;
            record.error_rate = error_rate;
            record.response_time_ms = latency;
            record.degradation =
                classify_record(healthy, error_rate, latency, &DegradationThresholds::default());
            record
        },
    )
}

proptest! {
    #[test]
    fn test_error_rate_stays_in_unit_interval(
        history in prop::collection::vec(any::<bool>(), 0..200)
    ) {
        let config = HealthConfig::default();
        let mut rate = 0.0;
        for success in history {
            rate = smoothed_error_rate(rate, success, config.success_smoothing, config.failure_smoothing);
            prop_assert!((0.0..=1.0).contains(&rate));
        }
    }

    #[test]
    fn test_failures_raise_and_successes_lower(start in 0.0f64..=1.0) {
        let config = HealthConfig::default();
        let after_failure = smoothed_error_rate(start, false, config.success_smoothing, config.failure_smoothing);
        let after_success = smoothed_error_rate(start, true, config.success_smoothing, config.failure_smoothing);
        prop_assert!(after_failure >= start);
        prop_assert!(after_success <= start);
    }

    #[test]
    fn test_record_label_is_monotone_in_error_rate(
        healthy in any::<bool>(),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        latency in 0u64..10_000,
    ) {
        let thresholds = DegradationThresholds::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            classify_record(healthy, low, latency, &thresholds)
                <= classify_record(healthy, high, latency, &thresholds)
        );
    }

    #[test]
    fn test_global_level_ignores_record_order(
        mut records in prop::collection::vec(arb_record(), 0..12)
    ) {
        let thresholds = DegradationThresholds::default();
        let forward = compute_global_level(records.iter(), &thresholds);
        records.reverse();
        prop_assert_eq!(forward, compute_global_level(records.iter(), &thresholds));
    }

    #[test]
    fn test_extra_unhealthy_service_never_lowers_level(
        records in prop::collection::vec(arb_record(), 0..12),
        error_rate in 0.0f64..=1.0,
    ) {
        let thresholds = DegradationThresholds::default();
        let before = compute_global_level(records.iter(), &thresholds);

        let mut failing = ServiceHealthRecord::new("extra");
        failing.is_healthy = false;
        failing.error_rate = error_rate;
        failing.degradation = classify_record(false, error_rate, 0, &thresholds);

        let mut extended = records.clone();
        extended.push(failing);
        let after = compute_global_level(extended.iter(), &thresholds);

        prop_assert!(after >= before);
        prop_assert!(after >= DegradationLevel::Limited);
    }

    #[test]
    fn test_latency_first_is_a_sorted_permutation(
        latencies in prop::collection::vec(0u64..5_000, 0..10)
    ) {
        let descriptors: Vec<ExecutorDescriptor> = latencies
            .iter()
            .enumerate()
            .map(|(i, latency)| {
                ExecutorDescriptor::new(format!("executor-{i}"), vec![TaskType::GeneralQuery], *latency)
            })
            .collect();
        let mut names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
        let original = names.clone();

        latency_first(&mut names, &descriptors);

        let mut sorted_names = names.clone();
        sorted_names.sort();
        let mut sorted_original = original.clone();
        sorted_original.sort();
        prop_assert_eq!(sorted_names, sorted_original);

        let ordered: Vec<u64> = names
            .iter()
            .map(|name| descriptors.iter().find(|d| &d.name == name).unwrap().configured_latency_ms)
            .collect();
        prop_assert!(ordered.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
