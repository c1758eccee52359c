use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimConfig;
use crate::geo::{distance_km, Location};
use crate::pricing::estimate_base_fare;

use super::RideRequest;

pub const PASSENGER_ROSTER: [&str; 6] = [
    "Ana Paula",
    "Joaquim Neto",
    "Esperança Lopes",
    "Helder Cassoma",
    "Marta Kiala",
    "Domingos Sebastião",
];

const PICKUP_OFFSET: (f64, f64) = (0.002, 0.002);
const PICKUP_ADDRESS: &str = "Mutamba, Luanda";
const DROPOFF_OFFSET: (f64, f64) = (-0.005, -0.002);
const DROPOFF_ADDRESS: &str = "Ilha do Cabo";

/// Seedable source of dispatch delays and synthetic ride requests.
#[derive(Resource)]
pub struct RequestGenerator {
    rng: StdRng,
    delay_min_ms: u64,
    delay_max_ms: u64,
    next_id: u64,
}

impl RequestGenerator {
    pub fn new(seed: Option<u64>, delay_min_ms: u64, delay_max_ms: u64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            delay_min_ms,
            delay_max_ms: delay_max_ms.max(delay_min_ms + 1),
            next_id: 1,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            config.seed,
            config.dispatch_delay_min_ms,
            config.dispatch_delay_max_ms,
        )
    }

    /// Uniform in `[min, max)`.
    pub fn sample_delay_ms(&mut self) -> u64 {
        self.rng.gen_range(self.delay_min_ms..self.delay_max_ms)
    }

    /// A request around `driver`. `None` when the synthesized points are not valid.
    pub fn synthesize(&mut self, driver: &Location) -> Option<RideRequest> {
        let origin = driver
            .offset(PICKUP_OFFSET.0, PICKUP_OFFSET.1)
            .with_address(PICKUP_ADDRESS);
        let destination = driver
            .offset(DROPOFF_OFFSET.0, DROPOFF_OFFSET.1)
            .with_address(DROPOFF_ADDRESS);
        if !origin.is_in_range() || !destination.is_in_range() {
            return None;
        }

        let distance = (distance_km(&origin, &destination) * 10.0).round() / 10.0;
        let passenger_name = PASSENGER_ROSTER[self.rng.gen_range(0..PASSENGER_ROSTER.len())];
        let rating = (self.rng.gen_range(4.5..=5.0_f64) * 10.0).round() / 10.0;
        let id = self.next_id;
        self.next_id += 1;

        Some(RideRequest {
            id,
            passenger_name: passenger_name.to_string(),
            rating,
            origin,
            destination,
            price: estimate_base_fare(distance),
            distance_km: distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_stay_in_window() {
        let mut generator = RequestGenerator::new(Some(11), 3000, 8000);
        for _ in 0..500 {
            let delay = generator.sample_delay_ms();
            assert!((3000..8000).contains(&delay), "delay {delay}");
        }
    }

    #[test]
    fn same_seed_same_requests() {
        let driver = Location::luanda_center();
        let mut a = RequestGenerator::new(Some(42), 3000, 8000);
        let mut b = RequestGenerator::new(Some(42), 3000, 8000);
        for _ in 0..5 {
            assert_eq!(a.sample_delay_ms(), b.sample_delay_ms());
            assert_eq!(a.synthesize(&driver), b.synthesize(&driver));
        }
    }

    #[test]
    fn request_is_offset_from_driver() {
        let driver = Location::new(-8.84, 13.29);
        let request = RequestGenerator::new(Some(1), 3000, 8000)
            .synthesize(&driver)
            .expect("request");

        assert!((request.origin.lat - (-8.838)).abs() < 1e-9);
        assert!((request.destination.lng - 13.288).abs() < 1e-9);
        assert_eq!(request.origin.address.as_deref(), Some("Mutamba, Luanda"));
        assert!((4.5..=5.0).contains(&request.rating));
        assert_eq!(request.price, estimate_base_fare(request.distance_km));
        assert!(PASSENGER_ROSTER.contains(&request.passenger_name.as_str()));
    }

    #[test]
    fn invalid_driver_position_yields_nothing() {
        let mut generator = RequestGenerator::new(Some(1), 3000, 8000);
        assert!(generator.synthesize(&Location::new(f64::NAN, 13.0)).is_none());
    }
}
