use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::tracking::{self, LocationAck, StatusAdvance};
use crate::error::AppError;
use crate::models::order::OrderStatus;
use crate::models::tracking::{DeliveryTracking, LocationUpdate};
use crate::models::GeoPoint;
use crate::state::AppState;

const RECENT_UPDATES_LIMIT: usize = 20;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tracking", post(create_tracking))
        .route("/tracking/:id/status", put(advance_status))
        .route("/tracking/:id/location", post(ingest_location))
        .route("/track/:share_code", get(get_by_share_code))
        .route("/orders/:id/tracking", get(get_by_order))
}

#[derive(Deserialize)]
pub struct CreateTrackingRequest {
    pub order_id: Uuid,
    pub driver_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: String,
    pub note: Option<String>,
    pub actual_arrival: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Deserialize)]
pub struct IngestLocationRequest {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub battery_level: Option<f64>,
}

#[derive(Serialize)]
pub struct AdvanceStatusResponse {
    pub tracking: DeliveryTracking,
    pub derived_order_status: Option<OrderStatus>,
    pub message: String,
}

#[derive(Serialize)]
pub struct IngestLocationResponse {
    pub location_update: LocationUpdate,
    pub eta: Option<chrono::DateTime<chrono::Utc>>,
    pub is_near_destination: bool,
}

/// Customer-facing projection: the tracking record plus its recent samples.
#[derive(Serialize)]
pub struct TrackingProjection {
    #[serde(flatten)]
    pub tracking: DeliveryTracking,
    pub recent_updates: Vec<LocationUpdate>,
}

async fn create_tracking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTrackingRequest>,
) -> Result<Json<DeliveryTracking>, AppError> {
    let tracking = tracking::create_tracking(&state, payload.order_id, payload.driver_id)?;
    Ok(Json(tracking))
}

async fn advance_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> Result<Json<AdvanceStatusResponse>, AppError> {
    // Arrival time is server-assigned and write-once; a client-supplied
    // value is never trusted.
    if payload.actual_arrival.is_some() {
        tracing::debug!(tracking_id = %id, "ignoring client-supplied actual_arrival");
    }

    let StatusAdvance {
        tracking,
        derived_order_status,
        message,
    } = tracking::advance_status(&state, id, &payload.status, payload.note)?;

    Ok(Json(AdvanceStatusResponse {
        tracking,
        derived_order_status,
        message,
    }))
}

async fn ingest_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<IngestLocationRequest>,
) -> Result<Json<IngestLocationResponse>, AppError> {
    let LocationAck {
        location_update,
        eta,
        is_near_destination,
    } = tracking::ingest_location(
        &state,
        id,
        GeoPoint {
            lat: payload.lat,
            lng: payload.lng,
        },
        payload.accuracy,
        payload.speed,
        payload.heading,
        payload.battery_level,
    )?;

    Ok(Json(IngestLocationResponse {
        location_update,
        eta,
        is_near_destination,
    }))
}

async fn get_by_share_code(
    State(state): State<Arc<AppState>>,
    Path(share_code): Path<String>,
) -> Result<Json<TrackingProjection>, AppError> {
    let tracking_id = state
        .tracking_by_share_code
        .get(&share_code)
        .map(|entry| *entry.value())
        .ok_or_else(|| AppError::NotFound("unknown share code".to_string()))?;

    projection(&state, tracking_id).map(Json)
}

async fn get_by_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<TrackingProjection>, AppError> {
    let tracking_id = state
        .tracking_by_order
        .get(&order_id)
        .map(|entry| *entry.value())
        .ok_or_else(|| AppError::NotFound(format!("no tracking for order {order_id}")))?;

    projection(&state, tracking_id).map(Json)
}

fn projection(state: &AppState, tracking_id: Uuid) -> Result<TrackingProjection, AppError> {
    let tracking = state
        .trackings
        .get(&tracking_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("tracking {tracking_id} not found")))?;

    let recent_updates = state
        .locations
        .get(&tracking_id)
        .map(|history| {
            history
                .iter()
                .rev()
                .take(RECENT_UPDATES_LIMIT)
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    Ok(TrackingProjection {
        tracking,
        recent_updates,
    })
}
