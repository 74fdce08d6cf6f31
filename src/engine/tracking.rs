use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::context::EnvContext;
use crate::engine::notify::NotificationSink;
use crate::error::AppError;
use crate::geo::{haversine_km, point_in_polygon, Geocoder};
use crate::models::driver::DriverStatus;
use crate::models::order::OrderStatus;
use crate::models::tracking::{
    DeliveryStatus, DeliveryTracking, LocationUpdate, StatusEntry, TrackingEvent,
};
use crate::models::GeoPoint;
use crate::state::AppState;

pub const AVERAGE_SPEED_KMH: f64 = 25.0;
pub const NEAR_DESTINATION_KM: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct StatusAdvance {
    pub tracking: DeliveryTracking,
    pub derived_order_status: Option<OrderStatus>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct LocationAck {
    pub location_update: LocationUpdate,
    pub eta: Option<DateTime<Utc>>,
    pub is_near_destination: bool,
}

/// Creates the 1:1 tracking record for an order entering fulfillment,
/// seeded with an ORDER_CONFIRMED history entry and a public share code.
pub fn create_tracking(
    state: &AppState,
    order_id: Uuid,
    driver_id: Option<Uuid>,
) -> Result<DeliveryTracking, AppError> {
    if !state.orders.contains_key(&order_id) {
        return Err(AppError::NotFound(format!("order {order_id} not found")));
    }

    let tracking_id = Uuid::new_v4();
    match state.tracking_by_order.entry(order_id) {
        Entry::Occupied(_) => {
            return Err(AppError::Conflict(format!(
                "order {order_id} already has a tracking record"
            )));
        }
        Entry::Vacant(vacant) => {
            vacant.insert(tracking_id);
        }
    }

    let now = state.env.now();
    let tracking = DeliveryTracking {
        id: tracking_id,
        order_id,
        driver_id,
        current_location: None,
        last_update: now,
        estimated_arrival: None,
        actual_arrival: None,
        status_history: vec![StatusEntry {
            status: DeliveryStatus::OrderConfirmed,
            at: now,
            note: "Order confirmed".to_string(),
        }],
        share_code: Uuid::new_v4().simple().to_string(),
    };

    state
        .tracking_by_share_code
        .insert(tracking.share_code.clone(), tracking_id);
    state.locations.insert(tracking_id, Vec::new());
    state.trackings.insert(tracking_id, tracking.clone());
    state.metrics.active_trackings.inc();

    info!(tracking_id = %tracking_id, order_id = %order_id, "tracking created");
    Ok(tracking)
}

/// Single entry point for driver-reported status transitions. Appends to
/// the history, mirrors the derived status onto the order, flips the
/// driver available on delivery, and fires a best-effort notification.
pub fn advance_status(
    state: &AppState,
    tracking_id: Uuid,
    raw_status: &str,
    note: Option<String>,
) -> Result<StatusAdvance, AppError> {
    let new_status = DeliveryStatus::parse(raw_status).ok_or_else(|| {
        AppError::BadRequest(format!("unrecognized delivery status: {raw_status}"))
    })?;

    let now = state.env.now();
    let (tracking, was_terminal) = {
        let mut entry = state
            .trackings
            .get_mut(&tracking_id)
            .ok_or_else(|| AppError::NotFound(format!("tracking {tracking_id} not found")))?;

        let current = entry.latest_status();
        if current.is_terminal() && new_status != current {
            return Err(AppError::Conflict(format!(
                "delivery is already {current} and cannot move to {new_status}"
            )));
        }

        entry.status_history.push(StatusEntry {
            status: new_status,
            at: now,
            note: note.unwrap_or_else(|| format!("Status updated to {new_status}")),
        });
        entry.last_update = now;

        // Write-once: a repeated DELIVERED keeps the original arrival time.
        if new_status == DeliveryStatus::Delivered && entry.actual_arrival.is_none() {
            entry.actual_arrival = Some(now);
        }

        (entry.clone(), current.is_terminal())
    };

    if new_status.is_terminal() && !was_terminal {
        state.metrics.active_trackings.dec();
    }

    if new_status == DeliveryStatus::Delivered {
        if let Some(driver_id) = tracking.driver_id {
            if let Some(mut driver) = state.drivers.get_mut(&driver_id) {
                driver.status = DriverStatus::Available;
                driver.updated_at = now;
            }
        }
    }

    let derived_order_status = new_status.order_status();
    if let Some(order_status) = derived_order_status {
        if let Some(mut order) = state.orders.get_mut(&tracking.order_id) {
            order.status = order_status;
        }
    }

    let message = format!("Delivery status updated to {new_status}");
    if let Err(err) = state
        .notifier
        .send(tracking.order_id, new_status, &message)
    {
        warn!(order_id = %tracking.order_id, error = %err, "notification dispatch failed");
    }

    state
        .metrics
        .status_transitions_total
        .with_label_values(&[new_status.as_str()])
        .inc();
    let _ = state.tracking_events_tx.send(TrackingEvent::StatusChanged {
        tracking_id,
        order_id: tracking.order_id,
        status: new_status,
        at: now,
    });

    info!(
        tracking_id = %tracking_id,
        order_id = %tracking.order_id,
        status = %new_status,
        "delivery status advanced"
    );

    Ok(StatusAdvance {
        tracking,
        derived_order_status,
        message,
    })
}

/// Ingests one device sample: appends it to the immutable location
/// history, refreshes current location and ETA, and auto-flags proximity.
pub fn ingest_location(
    state: &AppState,
    tracking_id: Uuid,
    point: GeoPoint,
    accuracy: Option<f64>,
    speed: Option<f64>,
    heading: Option<f64>,
    battery_level: Option<f64>,
) -> Result<LocationAck, AppError> {
    let order_id = state
        .trackings
        .get(&tracking_id)
        .map(|entry| entry.order_id)
        .ok_or_else(|| AppError::NotFound(format!("tracking {tracking_id} not found")))?;

    if !point.is_valid() {
        state
            .metrics
            .location_updates_total
            .with_label_values(&["rejected"])
            .inc();
        return Err(AppError::BadRequest(format!(
            "coordinate out of range: {}, {}",
            point.lat, point.lng
        )));
    }

    let destination = state
        .orders
        .get(&order_id)
        .map(|order| state.geocoder.geocode(&order.address));

    if let Some(zone) = &state.delivery_zone {
        if let Ok(false) = point_in_polygon(&point, zone) {
            warn!(
                tracking_id = %tracking_id,
                lat = point.lat,
                lng = point.lng,
                "location sample outside the configured delivery zone"
            );
        }
    }

    let now = state.env.now();
    let update = LocationUpdate {
        id: Uuid::new_v4(),
        tracking_id,
        location: point,
        accuracy,
        speed,
        heading,
        battery_level,
        derived_address: format!("near {:.4}, {:.4}", point.lat, point.lng),
        recorded_at: now,
    };

    let (eta, is_near_destination, auto_near) = {
        let mut entry = state
            .trackings
            .get_mut(&tracking_id)
            .ok_or_else(|| AppError::NotFound(format!("tracking {tracking_id} not found")))?;

        // Last write wins: late samples are not reordered.
        entry.current_location = Some(point);
        entry.last_update = now;

        let mut eta = None;
        let mut near = false;
        if let Some(dest) = destination {
            let distance_km = haversine_km(&point, &dest);
            let travel_secs = (distance_km / AVERAGE_SPEED_KMH * 3600.0).round() as i64;
            let arrival = now + Duration::seconds(travel_secs);
            entry.estimated_arrival = Some(arrival);
            eta = Some(arrival);
            near = distance_km <= NEAR_DESTINATION_KM;
        }

        // Proximity bypasses the full transition table: it only appends
        // history and touches the order, and only once per approach.
        let latest = entry.latest_status();
        let auto = near && latest != DeliveryStatus::NearDestination && !latest.is_terminal();
        if auto {
            entry.status_history.push(StatusEntry {
                status: DeliveryStatus::NearDestination,
                at: now,
                note: "Driver is approaching the destination".to_string(),
            });
        }

        (eta, near, auto)
    };

    if let Some(mut history) = state.locations.get_mut(&tracking_id) {
        history.push(update.clone());
    } else {
        state.locations.insert(tracking_id, vec![update.clone()]);
    }

    if auto_near {
        if let Some(mut order) = state.orders.get_mut(&order_id) {
            order.status = OrderStatus::Delivering;
        }
        state
            .metrics
            .status_transitions_total
            .with_label_values(&[DeliveryStatus::NearDestination.as_str()])
            .inc();
        let _ = state.tracking_events_tx.send(TrackingEvent::StatusChanged {
            tracking_id,
            order_id,
            status: DeliveryStatus::NearDestination,
            at: now,
        });
    }

    state
        .metrics
        .location_updates_total
        .with_label_values(&["accepted"])
        .inc();
    let _ = state.tracking_events_tx.send(TrackingEvent::LocationUpdated {
        tracking_id,
        location: point,
        eta,
        at: now,
    });

    debug!(
        tracking_id = %tracking_id,
        lat = point.lat,
        lng = point.lng,
        near = is_near_destination,
        "location update ingested"
    );

    Ok(LocationAck {
        location_update: update,
        eta,
        is_near_destination,
    })
}
