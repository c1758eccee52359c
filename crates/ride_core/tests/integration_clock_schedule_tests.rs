use bevy_ecs::prelude::World;
use ride_core::clock::{DriverTimer, EventKind, PassengerTimer, SimulationClock, TimerSlot};
use ride_core::notifications::{NotificationKind, Notifications};
use ride_core::runner::{passenger_schedule, run_until, run_until_empty};
use ride_core::test_helpers::test_passenger_app;

#[test]
fn clock_pops_events_in_time_order() {
    let mut clock = SimulationClock::default();
    clock.schedule_at(20, EventKind::Passenger(PassengerTimer::EnRouteTick));
    clock.schedule_at(5, EventKind::Passenger(PassengerTimer::MatchFound));
    clock.schedule_at(20, EventKind::Driver(DriverTimer::DispatchRequest));
    clock.schedule_at(10, EventKind::Passenger(PassengerTimer::ApproachTick));

    let order: Vec<_> = std::iter::from_fn(|| clock.pop_next())
        .map(|e| (e.timestamp, e.kind))
        .collect();
    assert_eq!(
        order,
        vec![
            (5, EventKind::Passenger(PassengerTimer::MatchFound)),
            (10, EventKind::Passenger(PassengerTimer::ApproachTick)),
            (20, EventKind::Passenger(PassengerTimer::EnRouteTick)),
            (20, EventKind::Driver(DriverTimer::DispatchRequest)),
        ]
    );
    assert_eq!(clock.now(), 20);
}

#[test]
fn rearming_a_slot_leaves_one_pending_timer() {
    let mut clock = SimulationClock::default();
    let mut slot = TimerSlot::default();
    let kind = EventKind::Passenger(PassengerTimer::ApproachTick);
    for delay in [1000, 500, 2000] {
        slot.arm(&mut clock, delay, kind);
    }
    assert_eq!(clock.pending(), 1);
    assert_eq!(clock.next_event_time(), Some(2000));
}

#[test]
fn run_until_stops_at_the_boundary() {
    let mut clock = SimulationClock::default();
    let mut notifications = Notifications::default();
    notifications.emit(&mut clock, "primeira", NotificationKind::Info);
    clock.advance_to(1000);
    notifications.emit(&mut clock, "segunda", NotificationKind::Info);

    let mut world = World::new();
    world.insert_resource(clock);
    world.insert_resource(notifications);
    let mut schedule = passenger_schedule();

    assert_eq!(run_until(&mut world, &mut schedule, 3999), 0);
    assert_eq!(world.resource::<Notifications>().active().len(), 2);

    assert_eq!(run_until(&mut world, &mut schedule, 4000), 1);
    let active = world.resource::<Notifications>().active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].message, "segunda");

    assert_eq!(run_until_empty(&mut world, &mut schedule, 10), 1);
    assert!(world.resource::<Notifications>().active().is_empty());
    assert_eq!(world.resource::<SimulationClock>().now(), 5000);
}

#[test]
fn idle_session_advances_time_without_events() {
    let mut app = test_passenger_app();
    assert_eq!(app.advance_by(60_000), 0);
    assert_eq!(app.now(), 60_000);
    assert!(app.clock().is_empty());
}
