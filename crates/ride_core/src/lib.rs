pub mod advisor;
pub mod clock;
pub mod config;
pub mod driver;
pub mod geo;
pub mod movement;
pub mod notifications;
pub mod passenger;
pub mod position;
pub mod pricing;
pub mod runner;
pub mod session;
pub mod systems;
pub mod telemetry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
