//! Tests for TickClock

use amf_simulator_core::TickClock;

#[test]
fn test_tick_times_are_multiples_of_period() {
    let clock = TickClock::new(10);

    assert_eq!(clock.tick_time(0), 0);
    assert_eq!(clock.tick_time(1), 10);
    assert_eq!(clock.tick_time(42), 420);
}

#[test]
fn test_horizon_is_exclusive_end() {
    let clock = TickClock::new(10);

    // 3 ticks fire at 0, 10, 20; the run ends at 30
    assert_eq!(clock.horizon(3), 30);
    assert_eq!(clock.horizon(0), 0);
}

#[test]
fn test_tick_at_maps_back_to_index() {
    let clock = TickClock::new(7);

    for index in 0..20 {
        let time = clock.tick_time(index);
        assert_eq!(clock.tick_at(time), index);
        assert_eq!(clock.tick_at(time + 6), index);
    }
}

#[test]
fn test_period_accessor() {
    assert_eq!(TickClock::new(600).period(), 600);
}

#[test]
#[should_panic(expected = "tick period must be positive")]
fn test_zero_period_panics() {
    TickClock::new(0);
}
