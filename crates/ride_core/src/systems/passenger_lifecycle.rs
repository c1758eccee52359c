use bevy_ecs::prelude::{Res, ResMut};

use crate::advisor::AdvisorResource;
use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::config::SimConfig;
use crate::notifications::Notifications;
use crate::passenger::{PassengerContext, PassengerSession};
use crate::telemetry::RideHistory;

pub fn passenger_timer_system(
    event: Res<CurrentEvent>,
    config: Res<SimConfig>,
    advisor: Res<AdvisorResource>,
    mut clock: ResMut<SimulationClock>,
    mut notifications: ResMut<Notifications>,
    mut history: ResMut<RideHistory>,
    mut session: ResMut<PassengerSession>,
) {
    let EventKind::Passenger(timer) = event.0.kind else {
        return;
    };

    let mut ctx = PassengerContext {
        clock: &mut clock,
        notifications: &mut notifications,
        history: &mut history,
        advisor: advisor.0.as_ref(),
        config: &config,
    };
    ctx.fire(&mut session, event.0.id, timer);
}
