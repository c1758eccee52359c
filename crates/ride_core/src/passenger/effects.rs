use tracing::debug;

use crate::advisor::{advised_tip, RideAdvisor};
use crate::clock::{EventKind, PassengerTimer, SimulationClock, TimerId};
use crate::config::SimConfig;
use crate::geo::Location;
use crate::notifications::Notifications;
use crate::telemetry::RideHistory;

use super::{Effect, PassengerEvent, PassengerSession, TransitionContext};

/// Borrowed session resources that passenger effects are carried out against.
pub struct PassengerContext<'a> {
    pub clock: &'a mut SimulationClock,
    pub notifications: &'a mut Notifications,
    pub history: &'a mut RideHistory,
    pub advisor: &'a dyn RideAdvisor,
    pub config: &'a SimConfig,
}

impl PassengerContext<'_> {
    pub fn dispatch(&mut self, session: &mut PassengerSession, event: PassengerEvent) {
        let effects = {
            let ctx = TransitionContext {
                now: self.clock.now(),
                config: self.config,
            };
            session.apply(event, &ctx)
        };
        for effect in effects {
            self.execute(session, effect);
        }
    }

    /// Deliver a popped passenger timer. Events whose handle is no longer held by
    /// the owning slot were superseded and are dropped.
    pub fn fire(&mut self, session: &mut PassengerSession, id: TimerId, timer: PassengerTimer) {
        let slot = match timer {
            PassengerTimer::MusicConnected => &mut session.music_timer,
            _ => &mut session.phase_timer,
        };
        if !slot.release_fired(id) {
            debug!(?timer, ?id, "dropping stale passenger timer");
            return;
        }
        self.dispatch(session, PassengerEvent::Timer(timer));
    }

    fn execute(&mut self, session: &mut PassengerSession, effect: Effect) {
        match effect {
            Effect::Notify { message, kind } => {
                self.notifications.emit(self.clock, message, kind);
            }
            Effect::ArmPhaseTimer { timer, delay_ms } => {
                let id = session
                    .phase_timer
                    .arm(self.clock, delay_ms, EventKind::Passenger(timer));
                debug!(?timer, ?id, delay_ms, "phase timer armed");
            }
            Effect::ClearPhaseTimer => {
                if session.phase_timer.disarm(self.clock) {
                    debug!("phase timer cancelled");
                }
            }
            Effect::ArmMusicTimer { delay_ms } => {
                session.music_timer.arm(
                    self.clock,
                    delay_ms,
                    EventKind::Passenger(PassengerTimer::MusicConnected),
                );
            }
            Effect::CancelMusicTimer => {
                session.music_timer.disarm(self.clock);
            }
            Effect::RequestTip => {
                let origin = session.user_location.label();
                let destination = session
                    .destination
                    .as_ref()
                    .map(Location::label)
                    .unwrap_or_default();
                session.ride_tip = Some(advised_tip(
                    self.advisor,
                    &self.config.brand,
                    &origin,
                    &destination,
                ));
            }
            Effect::RecordRide(record) => {
                debug!(outcome = ?record.outcome, fare_kz = record.fare_kz, "ride recorded");
                self.history.record(record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::CannedAdvisor;
    use crate::passenger::{RideStatus, Shortcut};

    #[test]
    fn superseded_phase_timer_is_dropped() {
        let mut clock = SimulationClock::default();
        let mut notifications = Notifications::default();
        let mut history = RideHistory::default();
        let config = SimConfig::default();
        let mut session = PassengerSession::new(Location::new(-8.84, 13.29));
        let mut ctx = PassengerContext {
            clock: &mut clock,
            notifications: &mut notifications,
            history: &mut history,
            advisor: &CannedAdvisor,
            config: &config,
        };

        ctx.dispatch(&mut session, PassengerEvent::Shortcut(Shortcut::Home));
        assert!(session.ride_tip().is_some());
        ctx.dispatch(&mut session, PassengerEvent::RequestRide);
        let first = session.phase_timer().expect("match timer armed");

        ctx.dispatch(&mut session, PassengerEvent::Cancel);
        assert!(session.phase_timer().is_none());
        assert!(!ctx.clock.is_scheduled(first));

        ctx.dispatch(&mut session, PassengerEvent::Shortcut(Shortcut::Home));
        ctx.dispatch(&mut session, PassengerEvent::RequestRide);

        ctx.fire(&mut session, first, PassengerTimer::MatchFound);
        assert_eq!(session.status(), RideStatus::Requesting);
        assert_eq!(ctx.history.cancelled_count(), 1);
    }
}
