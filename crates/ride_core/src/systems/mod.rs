pub mod driver_dispatch;
pub mod notification_expiry;
pub mod passenger_lifecycle;

#[cfg(test)]
mod end_to_end_tests {
    use crate::driver::DriverStatus;
    use crate::passenger::{RideStatus, Shortcut};
    use crate::telemetry::RideOutcome;
    use crate::test_helpers::{test_driver_app, test_passenger_app};

    #[test]
    fn passenger_ride_runs_to_completion_and_resets() {
        let mut app = test_passenger_app();
        app.choose_shortcut(Shortcut::Work);
        app.request_ride();
        assert_eq!(app.status(), RideStatus::Requesting);

        let mut seen = vec![app.status()];
        for _ in 0..600 {
            app.advance_by(1000);
            let status = app.status();
            if seen.last() != Some(&status) {
                seen.push(status);
            }
            if status == RideStatus::Idle {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![
                RideStatus::Requesting,
                RideStatus::Matched,
                RideStatus::InProgress,
                RideStatus::Completed,
                RideStatus::Idle,
            ]
        );
        assert_eq!(app.history().completed_count(), 1);
        assert_eq!(app.history().rides[0].outcome, RideOutcome::Completed);
        assert!(app.session().phase_timer().is_none());
    }

    #[test]
    fn driver_earns_fare_for_accepted_request() {
        let mut app = test_driver_app();
        app.toggle_online().expect("online");
        app.advance_by(8000);

        let request = app.pending_request().cloned().expect("request generated");
        app.accept(request.id).expect("accept");
        assert_eq!(app.status(), DriverStatus::Busy);

        app.complete().expect("complete");
        assert_eq!(app.status(), DriverStatus::Online);
        assert_eq!(app.earnings(), 12_500 + request.price);
        assert_eq!(app.ledger().trips.len(), 1);
    }
}
