use ride_core::notifications::{NotificationKind, Notifications};
use ride_core::passenger::RideStatus;
use ride_core::session::PassengerApp;

/// Advance one tick at a time until `status` is reached or `max_ms` elapses.
/// Returns `true` when the status was reached.
pub fn run_to_status(app: &mut PassengerApp, status: RideStatus, max_ms: u64) -> bool {
    let tick = app.config().tick_ms;
    let deadline = app.now() + max_ms;
    while app.now() < deadline {
        if app.status() == status {
            return true;
        }
        app.advance_by(tick);
    }
    app.status() == status
}

/// Every message emitted so far, expired or not.
pub fn messages(notifications: &Notifications) -> Vec<String> {
    notifications.log().iter().map(|n| n.message.clone()).collect()
}

pub fn last_kind(notifications: &Notifications) -> Option<NotificationKind> {
    notifications.latest().map(|n| n.kind)
}
