use std::env;

use crate::engine::context::Weather;
use crate::error::AppError;
use crate::models::GeoPoint;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub depot_lat: f64,
    pub depot_lng: f64,
    pub fuel_price_per_liter: f64,
    pub weather: Weather,
    pub delivery_zone: Option<Vec<GeoPoint>>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let weather = match env::var("WEATHER").as_deref() {
            Ok("rain") => Weather::Rain,
            _ => Weather::Clear,
        };

        let delivery_zone = match env::var("DELIVERY_ZONE") {
            Ok(raw) => Some(parse_zone(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            depot_lat: parse_or_default("DEPOT_LAT", -6.2)?,
            depot_lng: parse_or_default("DEPOT_LNG", 106.816_666)?,
            fuel_price_per_liter: parse_or_default("FUEL_PRICE_PER_LITER", 10_000.0)?,
            weather,
            delivery_zone,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            depot_lat: -6.2,
            depot_lng: 106.816_666,
            fuel_price_per_liter: 10_000.0,
            weather: Weather::Clear,
            delivery_zone: None,
        }
    }
}

/// Parses a `lat,lng;lat,lng;...` vertex list.
fn parse_zone(raw: &str) -> Result<Vec<GeoPoint>, AppError> {
    let mut vertices = Vec::new();
    for pair in raw.split(';') {
        let (lat, lng) = pair
            .split_once(',')
            .ok_or_else(|| AppError::Internal(format!("invalid DELIVERY_ZONE vertex: {pair}")))?;

        let point = GeoPoint {
            lat: lat
                .trim()
                .parse()
                .map_err(|err| AppError::Internal(format!("invalid DELIVERY_ZONE latitude: {err}")))?,
            lng: lng
                .trim()
                .parse()
                .map_err(|err| AppError::Internal(format!("invalid DELIVERY_ZONE longitude: {err}")))?,
        };

        if !point.is_valid() {
            return Err(AppError::Internal(format!(
                "DELIVERY_ZONE vertex out of range: {pair}"
            )));
        }

        vertices.push(point);
    }

    if vertices.len() < 3 {
        return Err(AppError::Internal(
            "DELIVERY_ZONE needs at least 3 vertices".to_string(),
        ));
    }

    Ok(vertices)
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_zone;

    #[test]
    fn zone_vertex_list_parses() {
        let zone = parse_zone("-6.25,106.75; -6.25,106.85; -6.15,106.85; -6.15,106.75").unwrap();
        assert_eq!(zone.len(), 4);
        assert!((zone[0].lat - -6.25).abs() < 1e-9);
        assert!((zone[2].lng - 106.85).abs() < 1e-9);
    }

    #[test]
    fn zone_with_fewer_than_three_vertices_is_rejected() {
        assert!(parse_zone("-6.25,106.75;-6.15,106.85").is_err());
    }

    #[test]
    fn malformed_zone_vertex_is_rejected() {
        assert!(parse_zone("-6.25;106.75;-6.15,106.85;0,0").is_err());
        assert!(parse_zone("91.0,0.0;0.0,0.0;1.0,1.0").is_err());
    }
}
