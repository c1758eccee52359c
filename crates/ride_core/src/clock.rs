//! Virtual clock and timer queue shared by every timed behaviour of a session.
//!
//! Nothing in the crate sleeps: delays and intervals are events scheduled on
//! [SimulationClock] and popped in time order by the runner. Equal timestamps
//! fire in the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::Resource;

use crate::notifications::NotificationId;

pub const ONE_SEC_MS: u64 = 1000;

/// Handle to a scheduled event; used to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Timers owned by the passenger ride lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassengerTimer {
    /// Fixed matching delay while `REQUESTING`.
    MatchFound,
    /// Driver approaches the pickup point while `MATCHED`.
    ApproachTick,
    /// Driver heads to the destination while `IN_PROGRESS`.
    EnRouteTick,
    /// Display delay before `COMPLETED` resets to `IDLE`.
    ResetAfterCompletion,
    /// Bluetooth handshake for the music preference; not tied to a phase.
    MusicConnected,
}

/// Timers owned by the driver dispatch simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverTimer {
    DispatchRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Passenger(PassengerTimer),
    Driver(DriverTimer),
    NotificationExpired(NotificationId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub id: TimerId,
    pub timestamp: u64,
    pub kind: EventKind,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by timestamp, then by scheduling order.
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event being processed by the current schedule run.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    next_id: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedule `kind` at an absolute timestamp. Timestamps in the past are clamped to `now`.
    pub fn schedule_at(&mut self, timestamp: u64, kind: EventKind) -> TimerId {
        debug_assert!(
            timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.events.push(Event {
            id,
            timestamp: timestamp.max(self.now),
            kind,
        });
        id
    }

    pub fn schedule_in(&mut self, delay_ms: u64, kind: EventKind) -> TimerId {
        self.schedule_at(self.now.saturating_add(delay_ms), kind)
    }

    /// Remove a pending event. Returns `false` when it already fired or was never scheduled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        before != self.events.len()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.events.iter().any(|event| event.id == id)
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|event| event.timestamp)
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    /// Move virtual time forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, timestamp: u64) {
        if timestamp > self.now {
            self.now = timestamp;
        }
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Holds at most one armed timer. Arming always tears down the previous handle first,
/// so a phase can never have two outstanding callbacks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerSlot(Option<TimerId>);

impl TimerSlot {
    pub fn arm(&mut self, clock: &mut SimulationClock, delay_ms: u64, kind: EventKind) -> TimerId {
        self.disarm(clock);
        let id = clock.schedule_in(delay_ms, kind);
        self.0 = Some(id);
        id
    }

    pub fn disarm(&mut self, clock: &mut SimulationClock) -> bool {
        match self.0.take() {
            Some(id) => clock.cancel(id),
            None => false,
        }
    }

    pub fn holds(&self, id: TimerId) -> bool {
        self.0 == Some(id)
    }

    /// Release the slot for an event that was just popped. `false` means the event is stale.
    pub fn release_fired(&mut self, id: TimerId) -> bool {
        if self.holds(id) {
            self.0 = None;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.0.is_some()
    }

    pub fn id(&self) -> Option<TimerId> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: EventKind = EventKind::Passenger(PassengerTimer::ApproachTick);
    const DISPATCH: EventKind = EventKind::Driver(DriverTimer::DispatchRequest);

    #[test]
    fn clock_pops_events_in_time_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(10, TICK);
        clock.schedule_at(5, TICK);
        clock.schedule_at(20, TICK);

        let first = clock.pop_next().expect("first event");
        assert_eq!(first.timestamp, 5);
        assert_eq!(clock.now(), 5);

        let second = clock.pop_next().expect("second event");
        assert_eq!(second.timestamp, 10);
        assert_eq!(clock.now(), 10);

        let third = clock.pop_next().expect("third event");
        assert_eq!(third.timestamp, 20);
        assert_eq!(clock.now(), 20);

        assert!(clock.pop_next().is_none());
        assert!(clock.is_empty());
    }

    #[test]
    fn equal_timestamps_fire_in_scheduling_order() {
        let mut clock = SimulationClock::default();
        let first = clock.schedule_at(7, DISPATCH);
        let second = clock.schedule_at(7, TICK);

        assert_eq!(clock.pop_next().expect("first").id, first);
        assert_eq!(clock.pop_next().expect("second").id, second);
    }

    #[test]
    fn cancelled_event_never_fires() {
        let mut clock = SimulationClock::default();
        let keep = clock.schedule_in(100, TICK);
        let dropped = clock.schedule_in(50, DISPATCH);

        assert!(clock.cancel(dropped));
        assert!(!clock.cancel(dropped), "second cancel is a no-op");
        assert!(!clock.is_scheduled(dropped));

        let event = clock.pop_next().expect("kept event");
        assert_eq!(event.id, keep);
        assert!(clock.pop_next().is_none());
    }

    #[test]
    fn advance_to_never_moves_backwards() {
        let mut clock = SimulationClock::default();
        clock.advance_to(500);
        assert_eq!(clock.now(), 500);
        clock.advance_to(200);
        assert_eq!(clock.now(), 500);

        clock.schedule_in(100, TICK);
        assert_eq!(clock.next_event_time(), Some(600));
    }

    #[test]
    fn timer_slot_rearm_cancels_previous_handle() {
        let mut clock = SimulationClock::default();
        let mut slot = TimerSlot::default();

        let first = slot.arm(&mut clock, 1000, TICK);
        let second = slot.arm(&mut clock, 1000, TICK);

        assert_ne!(first, second);
        assert!(!clock.is_scheduled(first));
        assert!(clock.is_scheduled(second));
        assert_eq!(clock.pending(), 1);

        let fired = clock.pop_next().expect("event");
        assert!(!slot.release_fired(first));
        assert!(slot.release_fired(fired.id));
        assert!(!slot.is_armed());
    }
}
