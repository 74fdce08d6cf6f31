use chrono::{Duration, Timelike};
use tracing::info;
use uuid::Uuid;

use crate::engine::context::EnvContext;
use crate::engine::cost;
use crate::engine::sequencer::{sequence_stops, PlacedStop};
use crate::error::AppError;
use crate::geo::{haversine_km, Geocoder};
use crate::models::driver::VehicleKind;
use crate::models::route::{Route, RouteStatus};
use crate::state::AppState;

/// Reorders a route's stops, recomputes its metrics, and persists the
/// result in one store write. Does not touch `Route.status`.
pub fn optimize(state: &AppState, route_id: Uuid) -> Result<Route, AppError> {
    let mut route = state
        .routes
        .get(&route_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("route {route_id} not found")))?;

    if matches!(route.status, RouteStatus::Completed | RouteStatus::Cancelled) {
        return Err(AppError::Conflict(format!(
            "route {route_id} is finished and cannot be re-optimized"
        )));
    }

    let now = state.env.now();
    let traffic = cost::traffic_factor(now.hour());

    let placed: Vec<PlacedStop> = route
        .stops
        .drain(..)
        .map(|stop| {
            let point = state.geocoder.geocode(&stop.address);
            PlacedStop { stop, point }
        })
        .collect();

    let ordered = sequence_stops(&state.depot, placed, traffic);

    // Round trip: depot through every stop and back.
    let mut total_km = 0.0;
    let mut cursor = state.depot;
    for stop in &ordered {
        total_km += haversine_km(&cursor, &stop.point);
        cursor = stop.point;
    }
    total_km += haversine_km(&cursor, &state.depot);
    let total_km = (total_km * 100.0).round() / 100.0;

    let stop_count = ordered.len();
    let penalty = cost::weather_penalty(state.env.current_weather());
    let minutes = cost::estimated_time_minutes(stop_count, total_km, penalty);

    let vehicle = state
        .drivers
        .get(&route.driver_id)
        .map(|driver| driver.vehicle)
        .unwrap_or(VehicleKind::Motorcycle);
    let fuel = cost::fuel_cost(total_km, vehicle, state.fuel_price_per_liter);
    let score = cost::optimization_score(total_km, minutes);

    // ETAs spread the total time evenly across positions rather than
    // accumulating per-leg travel time; kept for compatibility with the
    // reference behavior.
    let slot_minutes = minutes as f64 / (stop_count as f64 + 1.0);
    route.stops = ordered.into_iter().map(|p| p.stop).collect();
    for (idx, stop) in route.stops.iter_mut().enumerate() {
        let offset_secs = ((idx as f64 + 1.0) * slot_minutes * 60.0).round() as i64;
        stop.estimated_arrival = Some(now + Duration::seconds(offset_secs));
    }

    route.total_distance_km = Some(total_km);
    route.estimated_time_minutes = Some(minutes);
    route.fuel_cost = Some(fuel);
    route.optimization_score = Some(score);

    // Single insert: ordering, ETAs and metrics land together or not at all.
    state.routes.insert(route.id, route.clone());

    info!(
        route_id = %route.id,
        stops = stop_count,
        distance_km = total_km,
        minutes,
        score,
        "route optimized"
    );

    Ok(route)
}
