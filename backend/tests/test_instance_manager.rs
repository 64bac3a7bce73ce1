//! Tests for the instance manager tick loop
//!
//! Covers fair round-robin allocation, drop accounting, scale up/down,
//! graduated shutdown and the liveness safety net.

use amf_simulator_core::events::SimEvent;
use amf_simulator_core::{
    Event, FleetConfig, InstanceId, InstanceManager, InstanceState, RequestId, ShutdownPhase,
    Timeline,
};

fn config_with_capacity(capacity: u32) -> FleetConfig {
    FleetConfig {
        instance_capacity: capacity,
        ..FleetConfig::default()
    }
}

fn active_counts(manager: &InstanceManager) -> Vec<usize> {
    manager.instances().iter().map(|i| i.active_count()).collect()
}

/// Release every completion due before `until`, as the orchestrator would
fn drain_completions(
    manager: &mut InstanceManager,
    timeline: &mut Timeline<SimEvent>,
    until: u64,
) {
    while let Some((_, event)) = timeline.next_before(until) {
        if let SimEvent::CompleteRequest {
            instance_id,
            request_id,
        } = event
        {
            manager.complete_request(instance_id, request_id);
        }
    }
}

// ============================================================================
// Allocation
// ============================================================================

#[test]
fn test_round_robin_spreads_requests_evenly() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(config_with_capacity(10));
    manager.seed(3, 0);

    manager.allocate(7, 0, &mut timeline).unwrap();
    assert_eq!(active_counts(&manager), vec![3, 2, 2]);

    // The cursor resumes after the last instance served
    manager.allocate(2, 0, &mut timeline).unwrap();
    assert_eq!(active_counts(&manager), vec![3, 3, 3]);
}

#[test]
fn test_round_robin_skips_full_instances() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(config_with_capacity(2));
    manager.seed(3, 0);
    manager.allocate(2, 0, &mut timeline).unwrap();
    assert!(manager.complete_request(InstanceId(1), RequestId(1)));

    let outcome = manager.allocate(4, 0, &mut timeline).unwrap();
    assert_eq!(outcome.admitted, 4);
    assert_eq!(active_counts(&manager), vec![2, 1, 2]);

    // Next in turn is instance 0, which is full
    manager.allocate(1, 0, &mut timeline).unwrap();
    assert_eq!(active_counts(&manager), vec![2, 2, 2]);
}

#[test]
fn test_overflow_is_counted_exactly() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(config_with_capacity(100));
    manager.seed(2, 0);

    let outcome = manager.allocate(237, 0, &mut timeline).unwrap();

    assert_eq!(outcome.admitted, 200);
    assert_eq!(outcome.unallocated, 37);
    assert_eq!(manager.total_headroom(), 0);
    assert_eq!(
        manager.events().events_of_type("RequestsDropped")[0],
        &Event::RequestsDropped { time: 0, count: 37 }
    );
}

#[test]
fn test_each_admission_schedules_one_completion() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(config_with_capacity(100));
    manager.seed(1, 0);

    manager.allocate(40, 10, &mut timeline).unwrap();

    assert_eq!(timeline.pending(), 40);
    assert_eq!(timeline.peek_time(), Some(19));

    drain_completions(&mut manager, &mut timeline, 20);
    assert_eq!(manager.instances()[0].active_count(), 0);
}

#[test]
fn test_utilization_over_serving_instances() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(FleetConfig::default());
    manager.seed(1, 0);

    manager.allocate(5_000, 0, &mut timeline).unwrap();

    let expected = 5_000.0 / 12_000.0 * 100.0;
    assert!((manager.utilization_pct() - expected).abs() < 1e-9);
}

#[test]
fn test_utilization_of_empty_fleet_is_zero() {
    let manager = InstanceManager::new(FleetConfig::default());
    assert_eq!(manager.utilization_pct(), 0.0);
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn test_scale_up_creates_missing_instances() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(FleetConfig::default());
    manager.seed(1, 0);

    let outcome = manager.reconcile(4, 0, &mut timeline).unwrap();

    assert_eq!(outcome.created, 3);
    assert!(!outcome.forced);
    assert_eq!(manager.on_count(), 4);
    assert!(manager.instances()[1..].iter().all(|i| i.life() == 2.0));
}

#[test]
fn test_steady_fleet_is_kept_alive() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(FleetConfig::default());
    manager.seed(1, 0);
    manager.reconcile(2, 0, &mut timeline).unwrap();

    for tick in 1..20 {
        manager.process_tick(2, 0, tick * 10, &mut timeline).unwrap();
    }

    assert_eq!(manager.on_count(), 2);
    assert_eq!(manager.instances()[1].life(), 2.0);
    assert!(manager.events().events_of_type("ShutdownStarted").is_empty());
}

#[test]
fn test_scale_down_drains_excess_instance() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(FleetConfig::default());
    manager.seed(1, 0);
    manager.reconcile(2, 0, &mut timeline).unwrap();
    let excess = InstanceId(1);

    // t=10: life 2 → 1, not restored
    manager.process_tick(1, 0, 10, &mut timeline).unwrap();
    assert_eq!(manager.instance(excess).unwrap().life(), 1.0);
    assert_eq!(manager.instance(excess).unwrap().state(), InstanceState::On);

    // t=20: life 0 → phase 1
    manager.process_tick(1, 0, 20, &mut timeline).unwrap();
    let instance = manager.instance(excess).unwrap();
    assert_eq!(instance.state(), InstanceState::ShuttingDown);
    assert_eq!(instance.shutdown_phase(), Some(ShutdownPhase::Phase1));
    assert_eq!(instance.admission_limit(), 600);

    // t=30: phase 2
    manager.process_tick(1, 0, 30, &mut timeline).unwrap();
    let instance = manager.instance(excess).unwrap();
    assert_eq!(instance.shutdown_phase(), Some(ShutdownPhase::Phase2));
    assert_eq!(instance.admission_limit(), 120);

    // t=40: OFF
    manager.process_tick(1, 0, 40, &mut timeline).unwrap();
    assert_eq!(manager.instance(excess).unwrap().state(), InstanceState::Off);

    let history: Vec<(u64, &str)> = manager
        .events()
        .events_for_instance(excess)
        .iter()
        .map(|e| (e.time(), e.event_type()))
        .collect();
    assert_eq!(
        history,
        vec![
            (0, "InstanceCreated"),
            (0, "InstanceActivated"),
            (20, "ShutdownStarted"),
            (30, "DrainPhaseAdvanced"),
            (40, "InstanceStopped"),
        ]
    );

    // The seed is untouched and still serving
    assert_eq!(manager.on_count(), 1);
    assert!(manager.instances()[0].life().is_infinite());
}

#[test]
fn test_draining_instance_still_receives_requests() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(config_with_capacity(100));
    manager.seed(1, 0);
    manager.reconcile(2, 0, &mut timeline).unwrap();
    manager.process_tick(1, 0, 10, &mut timeline).unwrap();

    // Instance 1 enters phase 1 (limit 5) at t=20
    let outcome = manager.process_tick(1, 200, 20, &mut timeline).unwrap();

    assert_eq!(outcome.allocation.admitted, 105);
    assert_eq!(outcome.allocation.unallocated, 95);
    assert_eq!(active_counts(&manager), vec![100, 5]);
    assert_eq!(manager.active_count(), 2);
    assert_eq!(manager.on_count(), 1);
}

#[test]
fn test_forced_replacement_when_fleet_goes_dark() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(FleetConfig::default());

    let outcome = manager.process_tick(0, 10, 0, &mut timeline).unwrap();

    assert!(outcome.reconcile.forced);
    assert_eq!(manager.on_count(), 1);
    assert_eq!(outcome.allocation.admitted, 10);
    assert_eq!(
        manager.events().events()[0],
        Event::InstanceCreated {
            time: 0,
            instance_id: InstanceId(0),
            seed: false,
            forced: true,
        }
    );
}

#[test]
fn test_forced_replacement_skips_activation_delay() {
    let mut timeline = Timeline::new();
    let config = FleetConfig {
        activation_delay: 30,
        ..FleetConfig::default()
    };
    let mut manager = InstanceManager::new(config);

    let outcome = manager.reconcile(0, 0, &mut timeline).unwrap();

    assert!(outcome.forced);
    assert_eq!(manager.on_count(), 1);
    assert_eq!(manager.instances()[0].admission_limit(), 12_000);
    assert_eq!(timeline.pending(), 0);
}

#[test]
fn test_at_least_one_instance_on_after_every_tick() {
    let mut timeline = Timeline::new();
    let mut manager = InstanceManager::new(config_with_capacity(50));

    // Load comes and goes; no seed
    let required = [0, 3, 3, 0, 0, 0, 0, 2, 0, 0, 0, 0];
    for (tick, &need) in required.iter().enumerate() {
        let now = tick as u64 * 10;
        drain_completions(&mut manager, &mut timeline, now);
        manager.process_tick(need, 20, now, &mut timeline).unwrap();
        assert!(manager.on_count() >= 1, "no instance ON at t={}", now);
    }
}

#[test]
fn test_delayed_activation_via_timeline() {
    let mut timeline = Timeline::new();
    let config = FleetConfig {
        activation_delay: 5,
        ..FleetConfig::default()
    };
    let mut manager = InstanceManager::new(config);
    manager.seed(1, 0);

    let outcome = manager.reconcile(3, 10, &mut timeline).unwrap();
    assert_eq!(outcome.created, 2);
    assert_eq!(manager.on_count(), 1);
    assert_eq!(manager.pending_count(), 2);

    while let Some((time, event)) = timeline.next_before(20) {
        if let SimEvent::Activate { instance_id } = event {
            manager.activate(instance_id, time);
        }
    }

    assert_eq!(manager.on_count(), 3);
    assert_eq!(manager.pending_count(), 0);
    assert_eq!(manager.events().events_of_type("InstanceActivated").len(), 3);
    assert_eq!(manager.events().events_at_time(15).len(), 2);
}
