use bevy_ecs::prelude::{Res, ResMut};
use tracing::debug;

use crate::clock::{CurrentEvent, EventKind};
use crate::notifications::Notifications;

pub fn notification_expiry_system(event: Res<CurrentEvent>, mut notifications: ResMut<Notifications>) {
    let EventKind::NotificationExpired(id) = event.0.kind else {
        return;
    };
    if !notifications.expire(id) {
        debug!(id = id.0, "notification already gone");
    }
}
