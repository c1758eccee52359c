//! Session configuration: timings, movement profile, branding and dispatch window.
//!
//! Every field has a default, so a JSON file only needs the values it overrides.

use std::fs;
use std::path::{Path, PathBuf};

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Location;
use crate::movement::{APPROACH_FRACTION, ARRIVAL_EPSILON_DEG, EN_ROUTE_FRACTION};
use crate::notifications::NOTIFICATION_TTL_MS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Driver shown to the passenger once a match is found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverProfile {
    pub name: String,
    pub car_model: String,
    pub plate: String,
}

impl Default for DriverProfile {
    fn default() -> Self {
        Self {
            name: "Tio Mateus".to_string(),
            car_model: "Hyundai i10".to_string(),
            plate: "LD-88-22-HG".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct SimConfig {
    /// Brand name used in notifications, option names and advisor prompts.
    pub brand: String,
    /// Start position when the position provider fails.
    pub default_location: Location,
    /// Delay between requesting a ride and the match (ms).
    pub match_delay_ms: u64,
    /// Interval of every movement tick (ms).
    pub tick_ms: u64,
    pub approach_fraction: f64,
    pub en_route_fraction: f64,
    pub arrival_epsilon_deg: f64,
    /// How long `COMPLETED` is shown before resetting to `IDLE` (ms).
    pub completion_reset_ms: u64,
    /// Simulated bluetooth handshake before music starts (ms).
    pub music_handshake_ms: u64,
    pub notification_ttl_ms: u64,
    /// Driver request generation delay window, `[min, max)` in ms.
    pub dispatch_delay_min_ms: u64,
    pub dispatch_delay_max_ms: u64,
    /// Earnings shown when the driver session starts (Kz).
    pub driver_opening_earnings: i64,
    /// Offset of the matched driver from the passenger, in degrees.
    pub match_offset_deg: f64,
    pub matched_driver: DriverProfile,
    /// Seed for request generation; random when absent.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            brand: "Mbora".to_string(),
            default_location: Location::luanda_center(),
            match_delay_ms: 3000,
            tick_ms: 1000,
            approach_fraction: APPROACH_FRACTION,
            en_route_fraction: EN_ROUTE_FRACTION,
            arrival_epsilon_deg: ARRIVAL_EPSILON_DEG,
            completion_reset_ms: 2000,
            music_handshake_ms: 1500,
            notification_ttl_ms: NOTIFICATION_TTL_MS,
            dispatch_delay_min_ms: 3000,
            dispatch_delay_max_ms: 8000,
            driver_opening_earnings: 12_500,
            match_offset_deg: 0.003,
            matched_driver: DriverProfile::default(),
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.brand.trim().is_empty() {
            return Err(ConfigError::Invalid("brand must not be empty".into()));
        }
        if !self.default_location.is_in_range() {
            return Err(ConfigError::Invalid(format!(
                "default_location ({}, {}) is not a valid coordinate",
                self.default_location.lat, self.default_location.lng
            )));
        }
        for (name, fraction) in [
            ("approach_fraction", self.approach_fraction),
            ("en_route_fraction", self.en_route_fraction),
        ] {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be in (0, 1], got {fraction}"
                )));
            }
        }
        if !(self.arrival_epsilon_deg.is_finite() && self.arrival_epsilon_deg > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "arrival_epsilon_deg must be positive, got {}",
                self.arrival_epsilon_deg
            )));
        }
        if !self.match_offset_deg.is_finite() {
            return Err(ConfigError::Invalid("match_offset_deg must be finite".into()));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be greater than zero".into()));
        }
        if self.notification_ttl_ms == 0 {
            return Err(ConfigError::Invalid(
                "notification_ttl_ms must be greater than zero".into(),
            ));
        }
        if self.dispatch_delay_min_ms >= self.dispatch_delay_max_ms {
            return Err(ConfigError::Invalid(format!(
                "dispatch delay window [{}, {}) is empty",
                self.dispatch_delay_min_ms, self.dispatch_delay_max_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        config.validate().expect("default config");
        assert_eq!(config.match_delay_ms, 3000);
        assert_eq!(config.brand, "Mbora");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimConfig::from_json_str(r#"{ "brand": "Yango Angola", "seed": 7 }"#)
            .expect("config");
        assert_eq!(config.brand, "Yango Angola");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.tick_ms, 1000);
        assert_eq!(config.matched_driver, DriverProfile::default());
    }

    #[test]
    fn rejects_empty_dispatch_window() {
        let err = SimConfig::from_json_str(
            r#"{ "dispatch_delay_min_ms": 5000, "dispatch_delay_max_ms": 5000 }"#,
        )
        .expect_err("empty window");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_bad_fraction() {
        let mut config = SimConfig::default();
        config.en_route_fraction = 0.0;
        assert!(config.validate().is_err());
        config.en_route_fraction = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SimConfig::from_json_str("{ brand: ").expect_err("parse");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
