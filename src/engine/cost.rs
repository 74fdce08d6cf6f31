use crate::engine::context::Weather;
use crate::models::driver::VehicleKind;

const STOP_SERVICE_MINUTES: f64 = 15.0;
const MINUTES_PER_KM: f64 = 3.0;

/// Congestion multiplier by hour of day: morning and evening rush windows,
/// flat 1.0 otherwise.
pub fn traffic_factor(hour: u32) -> f64 {
    match hour {
        7..=9 => 1.5,
        17..=19 => 1.8,
        _ => 1.0,
    }
}

pub fn weather_penalty(weather: Weather) -> f64 {
    match weather {
        Weather::Rain => 1.3,
        Weather::Clear => 1.0,
    }
}

/// Fuel consumption in liters per kilometer.
pub fn consumption_rate(vehicle: VehicleKind) -> f64 {
    match vehicle {
        VehicleKind::Motorcycle => 0.025,
        VehicleKind::Car => 0.08,
        VehicleKind::Van => 0.12,
        VehicleKind::Bicycle => 0.0,
    }
}

pub fn fuel_cost(distance_km: f64, vehicle: VehicleKind, price_per_liter: f64) -> f64 {
    distance_km * consumption_rate(vehicle) * price_per_liter
}

pub fn estimated_time_minutes(stop_count: usize, distance_km: f64, weather_penalty: f64) -> u32 {
    let raw = (stop_count as f64 * STOP_SERVICE_MINUTES + distance_km * MINUTES_PER_KM)
        * weather_penalty;
    raw.round() as u32
}

/// Heuristic quality signal in [60, 100], monotonically decreasing in
/// distance and time. Not an optimality bound.
pub fn optimization_score(distance_km: f64, time_minutes: u32) -> u32 {
    let distance_penalty = (distance_km * 2.0).min(20.0);
    let time_penalty = (time_minutes as f64 * 0.1).min(15.0);
    let score = (100.0 - distance_penalty - time_penalty).round() as i64;
    score.max(60) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rush_hours_raise_the_traffic_factor() {
        assert_eq!(traffic_factor(8), 1.5);
        assert_eq!(traffic_factor(18), 1.8);
        assert_eq!(traffic_factor(12), 1.0);
        assert_eq!(traffic_factor(0), 1.0);
    }

    #[test]
    fn rush_window_boundaries_are_inclusive() {
        assert_eq!(traffic_factor(7), 1.5);
        assert_eq!(traffic_factor(9), 1.5);
        assert_eq!(traffic_factor(17), 1.8);
        assert_eq!(traffic_factor(19), 1.8);
        assert_eq!(traffic_factor(10), 1.0);
        assert_eq!(traffic_factor(20), 1.0);
    }

    #[test]
    fn bicycle_fuel_cost_is_always_zero() {
        assert_eq!(fuel_cost(0.0, VehicleKind::Bicycle, 10_000.0), 0.0);
        assert_eq!(fuel_cost(500.0, VehicleKind::Bicycle, 10_000.0), 0.0);
    }

    #[test]
    fn fuel_cost_scales_with_distance_and_vehicle() {
        let motorcycle = fuel_cost(10.0, VehicleKind::Motorcycle, 10_000.0);
        let van = fuel_cost(10.0, VehicleKind::Van, 10_000.0);

        assert!((motorcycle - 2_500.0).abs() < 1e-9);
        assert!((van - 12_000.0).abs() < 1e-9);
    }

    #[test]
    fn rain_inflates_estimated_time() {
        let clear = estimated_time_minutes(3, 10.0, weather_penalty(Weather::Clear));
        let rain = estimated_time_minutes(3, 10.0, weather_penalty(Weather::Rain));

        assert_eq!(clear, 75);
        assert_eq!(rain, 98);
    }

    #[test]
    fn score_stays_within_bounds_for_extreme_inputs() {
        assert_eq!(optimization_score(0.0, 0), 100);
        assert_eq!(optimization_score(10_000.0, 100_000), 65);
        assert!(optimization_score(10_000.0, 100_000) >= 60);
        assert!(optimization_score(0.0, 0) <= 100);
    }

    #[test]
    fn score_decreases_with_distance_and_time() {
        let short = optimization_score(2.0, 40);
        let long = optimization_score(8.0, 90);
        assert!(short > long);
    }
}
