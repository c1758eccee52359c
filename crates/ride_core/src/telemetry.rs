//! Ride history and driver ledger: records finished rides for the history and wallet views.

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::geo::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideOutcome {
    Completed,
    Cancelled,
}

/// One passenger ride, recorded on completion or on cancellation after the request.
/// Timestamps are simulation ms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideRecord {
    pub outcome: RideOutcome,
    pub option_id: &'static str,
    pub origin: Location,
    pub destination: Option<Location>,
    /// Quoted price for the selected option (Kz).
    pub fare_kz: i64,
    pub requested_at: u64,
    pub matched_at: Option<u64>,
    pub pickup_at: Option<u64>,
    pub ended_at: u64,
}

impl RideRecord {
    /// Time from request to driver match.
    pub fn time_to_match(&self) -> Option<u64> {
        self.matched_at.map(|m| m.saturating_sub(self.requested_at))
    }

    /// Time from match to pickup.
    pub fn time_to_pickup(&self) -> Option<u64> {
        match (self.matched_at, self.pickup_at) {
            (Some(matched), Some(pickup)) => Some(pickup.saturating_sub(matched)),
            _ => None,
        }
    }

    /// Time from pickup to arrival at the destination.
    pub fn trip_duration(&self) -> Option<u64> {
        self.pickup_at.map(|p| self.ended_at.saturating_sub(p))
    }
}

#[derive(Debug, Default, Resource)]
pub struct RideHistory {
    pub rides: Vec<RideRecord>,
}

impl RideHistory {
    pub fn record(&mut self, record: RideRecord) {
        self.rides.push(record);
    }

    pub fn completed_count(&self) -> usize {
        self.count(RideOutcome::Completed)
    }

    pub fn cancelled_count(&self) -> usize {
        self.count(RideOutcome::Cancelled)
    }

    /// Sum of fares of completed rides (Kz).
    pub fn total_spent(&self) -> i64 {
        self.rides
            .iter()
            .filter(|r| r.outcome == RideOutcome::Completed)
            .map(|r| r.fare_kz)
            .sum()
    }

    fn count(&self, outcome: RideOutcome) -> usize {
        self.rides.iter().filter(|r| r.outcome == outcome).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverTripRecord {
    pub request_id: u64,
    pub passenger_name: String,
    pub fare_kz: i64,
    pub distance_km: f64,
    pub accepted_at: u64,
    pub completed_at: u64,
}

#[derive(Debug, Default, Resource)]
pub struct DriverLedger {
    pub trips: Vec<DriverTripRecord>,
    pub requests_generated: u64,
    pub requests_accepted: u64,
    pub requests_rejected: u64,
}

impl DriverLedger {
    pub fn acceptance_rate(&self) -> Option<f64> {
        let decided = self.requests_accepted + self.requests_rejected;
        if decided == 0 {
            None
        } else {
            Some(self.requests_accepted as f64 / decided as f64)
        }
    }

    pub fn trip_earnings(&self) -> i64 {
        self.trips.iter().map(|t| t.fare_kz).sum()
    }
}
