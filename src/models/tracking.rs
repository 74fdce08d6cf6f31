use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::OrderStatus;
use crate::models::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    OrderConfirmed,
    Preparing,
    ReadyForPickup,
    OutForDelivery,
    NearDestination,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ORDER_CONFIRMED" => Some(Self::OrderConfirmed),
            "PREPARING" => Some(Self::Preparing),
            "READY_FOR_PICKUP" => Some(Self::ReadyForPickup),
            "OUT_FOR_DELIVERY" => Some(Self::OutForDelivery),
            "NEAR_DESTINATION" => Some(Self::NearDestination),
            "DELIVERED" => Some(Self::Delivered),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderConfirmed => "ORDER_CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::ReadyForPickup => "READY_FOR_PICKUP",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::NearDestination => "NEAR_DESTINATION",
            Self::Delivered => "DELIVERED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    /// Fixed mapping onto the external order status. `OrderConfirmed` and
    /// `NearDestination` leave the order untouched.
    pub fn order_status(&self) -> Option<OrderStatus> {
        match self {
            Self::Preparing => Some(OrderStatus::Preparing),
            Self::ReadyForPickup => Some(OrderStatus::ReadyForPickup),
            Self::OutForDelivery => Some(OrderStatus::Delivering),
            Self::Delivered => Some(OrderStatus::Completed),
            Self::Failed => Some(OrderStatus::Cancelled),
            Self::OrderConfirmed | Self::NearDestination => None,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: DeliveryStatus,
    pub at: DateTime<Utc>,
    pub note: String,
}

/// Live lifecycle record for one order's delivery, 1:1 with the order.
/// `status_history` only ever grows; `actual_arrival` is write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTracking {
    pub id: Uuid,
    pub order_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub current_location: Option<GeoPoint>,
    pub last_update: DateTime<Utc>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub status_history: Vec<StatusEntry>,
    pub share_code: String,
}

impl DeliveryTracking {
    pub fn latest_status(&self) -> DeliveryStatus {
        self.status_history
            .last()
            .map(|entry| entry.status)
            .unwrap_or(DeliveryStatus::OrderConfirmed)
    }
}

/// Immutable point-in-time sample from the driver's device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub id: Uuid,
    pub tracking_id: Uuid,
    pub location: GeoPoint,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub battery_level: Option<f64>,
    pub derived_address: String,
    pub recorded_at: DateTime<Utc>,
}

/// Events fanned out to live-tracking websocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackingEvent {
    StatusChanged {
        tracking_id: Uuid,
        order_id: Uuid,
        status: DeliveryStatus,
        at: DateTime<Utc>,
    },
    LocationUpdated {
        tracking_id: Uuid,
        location: GeoPoint,
        eta: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}
