use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::context::EnvContext;
use crate::engine::optimizer;
use crate::error::AppError;
use crate::models::driver::DriverStatus;
use crate::models::route::{Route, RouteStatus, Stop};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routes", post(create_route).get(list_routes))
        .route("/routes/:id", get(get_route).delete(delete_route))
        .route("/routes/:id/optimize", post(optimize_route))
        .route("/routes/:id/dispatch", post(dispatch_route))
        .route("/routes/:id/complete", post(complete_route))
}

#[derive(Deserialize)]
pub struct CreateRouteRequest {
    pub driver_id: Uuid,
    pub date: NaiveDate,
    pub stops: Vec<StopRequest>,
}

#[derive(Deserialize)]
pub struct StopRequest {
    pub order_id: Uuid,
    pub address: String,
}

async fn create_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRouteRequest>,
) -> Result<Json<Route>, AppError> {
    if payload.stops.is_empty() {
        return Err(AppError::BadRequest(
            "route needs at least one stop".to_string(),
        ));
    }

    if !state.drivers.contains_key(&payload.driver_id) {
        return Err(AppError::NotFound(format!(
            "driver {} not found",
            payload.driver_id
        )));
    }

    let route = Route {
        id: Uuid::new_v4(),
        driver_id: payload.driver_id,
        date: payload.date,
        status: RouteStatus::Planned,
        stops: payload
            .stops
            .into_iter()
            .enumerate()
            .map(|(idx, stop)| Stop {
                order_id: stop.order_id,
                address: stop.address,
                sequence: idx as u32 + 1,
                estimated_arrival: None,
            })
            .collect(),
        total_distance_km: None,
        estimated_time_minutes: None,
        fuel_cost: None,
        optimization_score: None,
        created_at: state.env.now(),
    };

    state.routes.insert(route.id, route.clone());
    Ok(Json(route))
}

async fn list_routes(State(state): State<Arc<AppState>>) -> Json<Vec<Route>> {
    let routes = state
        .routes
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(routes)
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    let route = state
        .routes
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("route {id} not found")))?;

    Ok(Json(route.value().clone()))
}

async fn delete_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    let status = state
        .routes
        .get(&id)
        .map(|route| route.status)
        .ok_or_else(|| AppError::NotFound(format!("route {id} not found")))?;

    if status == RouteStatus::Active {
        return Err(AppError::Conflict(format!(
            "route {id} is active and cannot be deleted"
        )));
    }

    // Stops cascade with the route record.
    let (_, route) = state
        .routes
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("route {id} not found")))?;

    Ok(Json(route))
}

async fn optimize_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    let start = Instant::now();
    let result = optimizer::optimize(&state, id);
    let outcome = if result.is_ok() { "success" } else { "error" };

    state
        .metrics
        .optimize_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .optimizations_total
        .with_label_values(&[outcome])
        .inc();

    result.map(Json)
}

async fn dispatch_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    let route = {
        let mut route = state
            .routes
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("route {id} not found")))?;

        if route.status != RouteStatus::Planned {
            return Err(AppError::Conflict(format!(
                "route {id} is not in PLANNED status"
            )));
        }

        route.status = RouteStatus::Active;
        route.clone()
    };

    if let Some(mut driver) = state.drivers.get_mut(&route.driver_id) {
        driver.status = DriverStatus::Busy;
        driver.updated_at = state.env.now();
    }

    Ok(Json(route))
}

async fn complete_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    let route = {
        let mut route = state
            .routes
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("route {id} not found")))?;

        if route.status != RouteStatus::Active {
            return Err(AppError::Conflict(format!(
                "route {id} is not in ACTIVE status"
            )));
        }

        route.status = RouteStatus::Completed;
        route.clone()
    };

    if let Some(mut driver) = state.drivers.get_mut(&route.driver_id) {
        driver.status = DriverStatus::Available;
        driver.updated_at = state.env.now();
    }

    Ok(Json(route))
}
