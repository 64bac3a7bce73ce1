//! Property tests for whole runs
//!
//! Random load profiles against a small fleet; every tick must conserve
//! requests, respect admission limits and keep an instance ON.

use amf_simulator_core::{
    required_instances, run_simulation, LoadSample, ProvisioningMode, SimulationConfig,
};
use proptest::prelude::*;

fn small_config() -> SimulationConfig {
    SimulationConfig {
        instance_capacity: 500,
        ..Default::default()
    }
}

fn load_profile() -> impl Strategy<Value = Vec<LoadSample>> {
    prop::collection::vec(
        (0.0f64..5_000.0, 0u64..5_000)
            .prop_map(|(predicted, real)| LoadSample::new(predicted, real)),
        1..25,
    )
}

fn mode() -> impl Strategy<Value = ProvisioningMode> {
    prop_oneof![Just(ProvisioningMode::Forecast), Just(ProvisioningMode::Ideal)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_requests_are_conserved(samples in load_profile(), mode in mode()) {
        let report = run_simulation(small_config(), mode, samples.clone()).unwrap();

        prop_assert_eq!(report.metrics.len(), samples.len());
        for (record, sample) in report.metrics.records().iter().zip(&samples) {
            prop_assert_eq!(record.total_load, sample.real);
            prop_assert_eq!(record.admitted + record.unallocated, sample.real);
            prop_assert!((0.0..=100.0).contains(&record.loss_pct));
        }
    }

    #[test]
    fn prop_admission_limits_hold(samples in load_profile(), mode in mode()) {
        let report = run_simulation(small_config(), mode, samples).unwrap();

        for snapshot in report.state_log.snapshots() {
            for instance in &snapshot.instances {
                prop_assert!(
                    instance.active_requests <= instance.effective_capacity as usize,
                    "instance {} at t={} holds {} > {}",
                    instance.id,
                    snapshot.time,
                    instance.active_requests,
                    instance.effective_capacity
                );
            }
        }
        for record in report.metrics.records() {
            prop_assert!(record.utilization_pct <= 100.0 + 1e-9);
        }
    }

    #[test]
    fn prop_some_instance_always_on(samples in load_profile(), mode in mode()) {
        let report = run_simulation(small_config(), mode, samples).unwrap();

        for record in report.metrics.records() {
            prop_assert!(record.on_instances >= 1);
            prop_assert!(record.on_instances <= record.active_instances);
            prop_assert!(record.active_instances <= report.instances_created);
        }
    }

    #[test]
    fn prop_runs_are_deterministic(samples in load_profile(), mode in mode()) {
        let first = run_simulation(small_config(), mode, samples.clone()).unwrap();
        let second = run_simulation(small_config(), mode, samples).unwrap();

        prop_assert_eq!(first.digest, second.digest);
        prop_assert_eq!(first.events.events(), second.events.events());
    }

    #[test]
    fn prop_ideal_mode_never_drops_with_fresh_fleet(
        real in prop::collection::vec(0u64..5_000, 1..15)
    ) {
        // Requests drain within a tick, so planning from the real load always fits
        let samples: Vec<LoadSample> = real.iter().map(|&r| LoadSample::new(0.0, r)).collect();
        let report = run_simulation(small_config(), ProvisioningMode::Ideal, samples).unwrap();

        prop_assert_eq!(report.metrics.total_unallocated(), 0);
    }

    #[test]
    fn prop_required_instances_monotonic(a in 0.0f64..1e7, b in 0.0f64..1e7, pct in 1.0f64..100.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(required_instances(low, 12_000, pct) <= required_instances(high, 12_000, pct));
    }

    #[test]
    fn prop_required_instances_cover_load(load in 0.0f64..1e7, pct in 1.0f64..100.0) {
        let needed = required_instances(load, 12_000, pct);
        prop_assert!(needed as f64 * 12_000.0 * pct / 100.0 >= load - 1e-6);
    }
}
