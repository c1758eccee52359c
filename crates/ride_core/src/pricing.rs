//! Fare estimation and the static vehicle-category catalog.
//!
//! Prices are whole Kwanza (Kz); there are no fractional sub-units.

use crate::geo::{distance_km, Location};

/// Base fare in Kz.
pub const BASE_FARE_KZ: i64 = 500;

/// Per-kilometer rate in Kz.
pub const PER_KM_RATE_KZ: f64 = 200.0;

/// Option selected when the passenger has not picked one.
pub const DEFAULT_OPTION_ID: &str = "economy";

/// Vehicle category offered to the passenger. Immutable reference data.
#[derive(Debug, Clone, PartialEq)]
pub struct RideOption {
    pub id: &'static str,
    /// Category label; shown after the brand name, e.g. "Mbora Mini".
    pub label: &'static str,
    pub price_multiplier: f64,
    pub eta_minutes: u32,
    pub description: &'static str,
}

impl RideOption {
    pub fn display_name(&self, brand: &str) -> String {
        format!("{brand} {}", self.label)
    }
}

pub static RIDE_OPTIONS: [RideOption; 3] = [
    RideOption {
        id: "moto",
        label: "Moto",
        price_multiplier: 0.6,
        eta_minutes: 2,
        description: "Finta o trânsito",
    },
    RideOption {
        id: "economy",
        label: "Mini",
        price_multiplier: 1.0,
        eta_minutes: 4,
        description: "Econômico e ágil",
    },
    RideOption {
        id: "comfort",
        label: "VIP",
        price_multiplier: 1.5,
        eta_minutes: 6,
        description: "Luxo e conforto",
    },
];

pub fn find_option(id: &str) -> Option<&'static RideOption> {
    RIDE_OPTIONS.iter().find(|option| option.id == id)
}

pub fn default_option() -> &'static RideOption {
    &RIDE_OPTIONS[1]
}

/// Distance-derived base price.
///
/// Formula: `BASE_FARE_KZ + round(distance_km * PER_KM_RATE_KZ)`; falls back to
/// `BASE_FARE_KZ` when the distance is not a usable number.
pub fn estimate_base_fare(distance_km: f64) -> i64 {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return BASE_FARE_KZ;
    }
    let fare = BASE_FARE_KZ as f64 + (distance_km * PER_KM_RATE_KZ).round();
    if fare.is_finite() {
        fare as i64
    } else {
        BASE_FARE_KZ
    }
}

/// Base price between two points; `BASE_FARE_KZ` when either is invalid.
pub fn estimate_trip_fare(origin: &Location, destination: &Location) -> i64 {
    estimate_base_fare(distance_km(origin, destination))
}

/// Final price for one category.
pub fn fare_for_option(base_fare: i64, option: &RideOption) -> i64 {
    (base_fare as f64 * option.price_multiplier).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_is_base_fare() {
        assert_eq!(estimate_base_fare(0.0), BASE_FARE_KZ);
    }

    #[test]
    fn fare_includes_base_and_rounded_distance() {
        assert_eq!(estimate_base_fare(1.0), 700);
        assert_eq!(estimate_base_fare(2.345), 500 + 469);
        assert_eq!(estimate_base_fare(0.0024), 500);
        assert_eq!(estimate_base_fare(0.0026), 501);
    }

    #[test]
    fn unusable_distance_falls_back_to_base() {
        assert_eq!(estimate_base_fare(f64::NAN), BASE_FARE_KZ);
        assert_eq!(estimate_base_fare(f64::INFINITY), BASE_FARE_KZ);
        assert_eq!(estimate_base_fare(-3.0), BASE_FARE_KZ);
    }

    #[test]
    fn option_multipliers_apply_with_rounding() {
        let economy = find_option("economy").expect("economy");
        let comfort = find_option("comfort").expect("comfort");
        let moto = find_option("moto").expect("moto");

        assert_eq!(fare_for_option(821, economy), 821);
        assert_eq!(fare_for_option(821, comfort), 1232);
        assert_eq!(fare_for_option(821, moto), 493);
    }

    #[test]
    fn catalog_lookup() {
        assert!(find_option("helicopter").is_none());
        assert_eq!(default_option().id, DEFAULT_OPTION_ID);
        assert_eq!(default_option().display_name("Mbora"), "Mbora Mini");
    }

    #[test]
    fn invalid_endpoints_price_at_base() {
        let origin = Location::new(-8.84, 13.29);
        let bad = Location::new(f64::NAN, 0.0);
        assert_eq!(estimate_trip_fare(&origin, &bad), BASE_FARE_KZ);
    }
}
