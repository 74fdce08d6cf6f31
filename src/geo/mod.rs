use std::hash::{DefaultHasher, Hash, Hasher};

use crate::error::AppError;
use crate::models::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Ray-casting containment test against an implicitly closed polygon.
/// Self-intersecting or degenerate polygons yield whatever ray casting
/// yields; zone geometry is assumed simple.
pub fn point_in_polygon(p: &GeoPoint, polygon: &[GeoPoint]) -> Result<bool, AppError> {
    if polygon.len() < 3 {
        return Err(AppError::BadRequest(
            "polygon needs at least 3 vertices".to_string(),
        ));
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = &polygon[i];
        let b = &polygon[j];
        let crosses = (a.lat > p.lat) != (b.lat > p.lat)
            && p.lng < (b.lng - a.lng) * (p.lat - a.lat) / (b.lat - a.lat) + a.lng;
        if crosses {
            inside = !inside;
        }
        j = i;
    }

    Ok(inside)
}

pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> GeoPoint;
}

/// Fallback used when no real geocoding backend is configured: hashes the
/// address into a small box around the origin. Stable per address string,
/// which is the only contract route optimization relies on.
pub struct HashGeocoder {
    origin: GeoPoint,
}

impl HashGeocoder {
    pub fn new(origin: GeoPoint) -> Self {
        Self { origin }
    }
}

impl Geocoder for HashGeocoder {
    fn geocode(&self, address: &str) -> GeoPoint {
        let mut hasher = DefaultHasher::new();
        address.hash(&mut hasher);
        let digest = hasher.finish();

        let lat_offset = ((digest & 0xFFFF) as f64 / 65_535.0 - 0.5) * 0.1;
        let lng_offset = (((digest >> 16) & 0xFFFF) as f64 / 65_535.0 - 0.5) * 0.1;

        GeoPoint {
            lat: (self.origin.lat + lat_offset).clamp(-90.0, 90.0),
            lng: (self.origin.lng + lng_offset).clamp(-180.0, 180.0),
        }
    }
}
