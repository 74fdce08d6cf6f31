use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Planned,
    Active,
    Completed,
    Cancelled,
}

/// One drop-off within a route. `sequence` is 1-based and unique within the
/// route; it and `estimated_arrival` are rewritten only by the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub order_id: Uuid,
    pub address: String,
    pub sequence: u32,
    pub estimated_arrival: Option<DateTime<Utc>>,
}

/// Ordered delivery plan for one driver on one date. The metric fields are
/// populated together by the optimizer and are never individually stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub date: NaiveDate,
    pub status: RouteStatus,
    pub stops: Vec<Stop>,
    pub total_distance_km: Option<f64>,
    pub estimated_time_minutes: Option<u32>,
    pub fuel_cost: Option<f64>,
    pub optimization_score: Option<u32>,
    pub created_at: DateTime<Utc>,
}
