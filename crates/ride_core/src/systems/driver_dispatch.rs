use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::driver::{DriverContext, DriverSession, RequestGenerator};
use crate::notifications::Notifications;
use crate::telemetry::DriverLedger;

pub fn driver_timer_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut notifications: ResMut<Notifications>,
    mut ledger: ResMut<DriverLedger>,
    mut generator: ResMut<RequestGenerator>,
    mut session: ResMut<DriverSession>,
) {
    let EventKind::Driver(timer) = event.0.kind else {
        return;
    };

    let mut ctx = DriverContext {
        clock: &mut clock,
        notifications: &mut notifications,
        ledger: &mut ledger,
        generator: &mut generator,
    };
    ctx.fire(&mut session, event.0.id, timer);
}
