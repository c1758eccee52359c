//! Session runner: advances the clock and routes events into the ECS.
//!
//! Each step pops the next event from [SimulationClock], inserts it as
//! [CurrentEvent], then runs the schedule. Passenger and driver sessions each
//! get their own world and schedule.

use bevy_ecs::prelude::Res;
use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::systems::{
    driver_dispatch::driver_timer_system, notification_expiry::notification_expiry_system,
    passenger_lifecycle::passenger_timer_system,
};

fn is_passenger_timer(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| matches!(e.0.kind, EventKind::Passenger(_)))
        .unwrap_or(false)
}

fn is_driver_timer(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| matches!(e.0.kind, EventKind::Driver(_)))
        .unwrap_or(false)
}

fn is_notification_expired(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| matches!(e.0.kind, EventKind::NotificationExpired(_)))
        .unwrap_or(false)
}

pub fn passenger_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        passenger_timer_system.run_if(is_passenger_timer),
        notification_expiry_system.run_if(is_notification_expired),
    ));
    schedule
}

pub fn driver_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        driver_timer_system.run_if(is_driver_timer),
        notification_expiry_system.run_if(is_notification_expired),
    ));
    schedule
}

/// Runs one step. Returns `false` if the clock was empty.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    true
}

/// Runs every event due at or before `until_ms`, then moves the clock to `until_ms`.
/// Returns the number of steps executed.
pub fn run_until(world: &mut World, schedule: &mut Schedule, until_ms: u64) -> usize {
    let mut steps = 0;
    while world
        .resource::<SimulationClock>()
        .next_event_time()
        .is_some_and(|ts| ts <= until_ms)
    {
        if !run_next_event(world, schedule) {
            break;
        }
        steps += 1;
    }
    world.resource_mut::<SimulationClock>().advance_to(until_ms);
    steps
}

/// Runs steps until the event queue is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}
