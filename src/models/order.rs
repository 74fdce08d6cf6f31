use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// External order status mirrored from delivery progress. The engine only
/// writes the subset reachable through the tracking state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Preparing,
    ReadyForPickup,
    Delivering,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: Option<String>,
    pub address: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}
