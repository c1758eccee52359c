//! Shared setup for unit and integration tests.

use crate::advisor::CannedAdvisor;
use crate::config::SimConfig;
use crate::geo::Location;
use crate::session::{DriverApp, PassengerApp};

/// Seed used by every test config so request generation is reproducible.
pub const TEST_SEED: u64 = 7;

pub fn test_config() -> SimConfig {
    SimConfig::default().with_seed(TEST_SEED)
}

/// Passenger start position used across tests.
pub fn test_user_location() -> Location {
    Location::new(-8.84, 13.29)
}

pub fn test_destination() -> Location {
    Location::new(-8.83, 13.28)
}

pub fn test_passenger_app() -> PassengerApp {
    PassengerApp::new(test_config(), test_user_location(), CannedAdvisor)
}

pub fn test_driver_app() -> DriverApp {
    DriverApp::new(test_config(), test_user_location())
}
