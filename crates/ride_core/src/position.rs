//! Initial device position. Best effort: any failure falls back to the configured default.

use thiserror::Error;
use tracing::warn;

use crate::geo::Location;

/// Address given to a device fix that carries none.
pub const DEVICE_ADDRESS: &str = "Minha Localização";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("position permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

pub trait PositionProvider {
    fn current_position(&self) -> Result<Location, PositionError>;
}

/// Always reports the same coordinate.
#[derive(Debug, Clone)]
pub struct FixedPosition(pub Location);

impl PositionProvider for FixedPosition {
    fn current_position(&self) -> Result<Location, PositionError> {
        Ok(self.0.clone())
    }
}

/// No positioning hardware.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPosition;

impl PositionProvider for NoPosition {
    fn current_position(&self) -> Result<Location, PositionError> {
        Err(PositionError::Unavailable("no position source".into()))
    }
}

pub fn resolve_start_location(provider: &dyn PositionProvider, fallback: &Location) -> Location {
    match provider.current_position() {
        Ok(location) if location.is_in_range() => {
            if location.address.is_some() {
                location
            } else {
                location.with_address(DEVICE_ADDRESS)
            }
        }
        Ok(location) => {
            warn!(lat = location.lat, lng = location.lng, "ignoring invalid device position");
            fallback.clone()
        }
        Err(err) => {
            warn!(error = %err, "device position unavailable, using default location");
            fallback.clone()
        }
    }
}
