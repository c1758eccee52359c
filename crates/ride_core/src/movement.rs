//! Straight-line movement: advances a simulated vehicle toward a target by a fixed
//! fraction of the remaining offset per tick.

use crate::config::SimConfig;
use crate::geo::Location;

/// Arrival tolerance in degrees on each axis (~22 m).
pub const ARRIVAL_EPSILON_DEG: f64 = 0.0002;

/// Fraction of the remaining offset covered per tick while approaching the pickup.
pub const APPROACH_FRACTION: f64 = 0.1;

/// Fraction covered per tick while driving to the destination.
pub const EN_ROUTE_FRACTION: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Moved closer; carries the new position.
    Moved(Location),
    /// Within tolerance; carries the target exactly.
    Arrived(Location),
    /// The update was discarded and the previous position stands.
    Held,
}

/// Interval length and fraction of one movement phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickProfile {
    pub interval_ms: u64,
    pub fraction: f64,
    pub epsilon_deg: f64,
}

impl TickProfile {
    pub fn approach(config: &SimConfig) -> Self {
        Self {
            interval_ms: config.tick_ms,
            fraction: config.approach_fraction,
            epsilon_deg: config.arrival_epsilon_deg,
        }
    }

    pub fn en_route(config: &SimConfig) -> Self {
        Self {
            interval_ms: config.tick_ms,
            fraction: config.en_route_fraction,
            epsilon_deg: config.arrival_epsilon_deg,
        }
    }

    pub fn step(&self, current: &Location, target: &Location) -> StepOutcome {
        step_toward(current, target, self.fraction, self.epsilon_deg)
    }
}

pub fn has_arrived(current: &Location, target: &Location, epsilon_deg: f64) -> bool {
    (target.lat - current.lat).abs() < epsilon_deg && (target.lng - current.lng).abs() < epsilon_deg
}

/// One interpolation tick: `next = current + (target - current) * fraction`.
///
/// The arrival test runs on the current position, so a point already on the
/// target keeps reporting [StepOutcome::Arrived] without moving.
pub fn step_toward(current: &Location, target: &Location, fraction: f64, epsilon_deg: f64) -> StepOutcome {
    if !current.is_valid() || !target.is_valid() {
        return StepOutcome::Held;
    }
    if !(fraction > 0.0 && fraction <= 1.0) {
        return StepOutcome::Held;
    }
    if has_arrived(current, target, epsilon_deg) {
        return StepOutcome::Arrived(target.clone());
    }

    let next = Location::new(
        current.lat + (target.lat - current.lat) * fraction,
        current.lng + (target.lng - current.lng) * fraction,
    );
    if next.is_valid() {
        StepOutcome::Moved(next)
    } else {
        StepOutcome::Held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_by_fraction_of_remaining_offset() {
        let current = Location::new(0.0, 0.0);
        let target = Location::new(1.0, -2.0);

        match step_toward(&current, &target, 0.1, ARRIVAL_EPSILON_DEG) {
            StepOutcome::Moved(next) => {
                assert!((next.lat - 0.1).abs() < 1e-12);
                assert!((next.lng + 0.2).abs() < 1e-12);
            }
            other => panic!("expected move, got {other:?}"),
        }
    }

    #[test]
    fn snaps_to_target_within_epsilon() {
        let target = Location::new(-8.84, 13.29).with_address("Casa");
        let current = target.offset(0.00019, -0.00019);

        assert_eq!(
            step_toward(&current, &target, 0.05, ARRIVAL_EPSILON_DEG),
            StepOutcome::Arrived(target.clone())
        );
    }

    #[test]
    fn arrived_point_stays_arrived() {
        let target = Location::new(-8.84, 13.29);
        for _ in 0..3 {
            assert_eq!(
                step_toward(&target, &target, 0.1, ARRIVAL_EPSILON_DEG),
                StepOutcome::Arrived(target.clone())
            );
        }
    }

    #[test]
    fn non_finite_update_is_discarded() {
        let current = Location::new(f64::MAX, 0.0);
        let target = Location::new(-f64::MAX, 0.0);
        assert_eq!(step_toward(&current, &target, 0.5, ARRIVAL_EPSILON_DEG), StepOutcome::Held);

        let bad = Location::new(f64::NAN, 0.0);
        assert_eq!(step_toward(&bad, &target, 0.5, ARRIVAL_EPSILON_DEG), StepOutcome::Held);
    }

    #[test]
    fn out_of_range_fraction_holds() {
        let current = Location::new(0.0, 0.0);
        let target = Location::new(1.0, 1.0);
        assert_eq!(step_toward(&current, &target, 0.0, ARRIVAL_EPSILON_DEG), StepOutcome::Held);
        assert_eq!(step_toward(&current, &target, 1.5, ARRIVAL_EPSILON_DEG), StepOutcome::Held);
    }

    #[test]
    fn approach_converges_from_matched_offset() {
        let profile = TickProfile::approach(&SimConfig::default());
        let target = Location::new(-8.84, 13.29);
        let mut current = target.offset(0.003, 0.003);
        let mut ticks = 0;
        loop {
            ticks += 1;
            match profile.step(&current, &target) {
                StepOutcome::Moved(next) => current = next,
                StepOutcome::Arrived(at) => {
                    assert_eq!(at, target);
                    break;
                }
                StepOutcome::Held => panic!("approach should never hold"),
            }
            assert!(ticks < 100, "approach did not converge");
        }
        assert!((25..=30).contains(&ticks), "took {ticks} ticks");
    }
}
