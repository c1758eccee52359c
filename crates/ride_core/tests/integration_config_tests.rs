use std::fs;

use ride_core::advisor::CannedAdvisor;
use ride_core::config::{ConfigError, SimConfig};
use ride_core::geo::Location;
use ride_core::passenger::RideStatus;
use ride_core::position::{FixedPosition, NoPosition, DEVICE_ADDRESS};
use ride_core::session::{DriverApp, PassengerApp};
use ride_core::test_helpers::test_destination;

#[test]
fn loads_overrides_from_file() {
    let path = std::env::temp_dir().join(format!("ride_core_config_{}.json", std::process::id()));
    fs::write(
        &path,
        r#"{ "brand": "Yango Angola", "match_delay_ms": 1000, "seed": 99 }"#,
    )
    .expect("write config");

    let config = SimConfig::from_path(&path).expect("config");
    fs::remove_file(&path).ok();
    assert_eq!(config.brand, "Yango Angola");
    assert_eq!(config.match_delay_ms, 1000);
    assert_eq!(config.completion_reset_ms, 2000);

    let mut app = PassengerApp::new(config, Location::new(-8.84, 13.29), CannedAdvisor);
    app.select_point(test_destination());
    app.request_ride();
    app.advance_by(1000);
    assert_eq!(app.status(), RideStatus::Matched);
    assert!(app
        .notifications()
        .latest()
        .is_some_and(|n| n.message.starts_with("Yango Angola a caminho!")));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = SimConfig::from_path("/nonexistent/ride_core.json").expect_err("missing");
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn position_failure_starts_at_default_location() {
    let app = PassengerApp::with_provider(SimConfig::default(), &NoPosition, CannedAdvisor);
    assert_eq!(app.session().user_location(), &Location::luanda_center());

    let driver = DriverApp::with_provider(
        SimConfig::default(),
        &FixedPosition(Location::new(-8.9, 13.2)),
    );
    assert_eq!(driver.session().location().address.as_deref(), Some(DEVICE_ADDRESS));
}
