use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::context::{EnvContext, SystemEnv};
use crate::engine::notify::{LogNotifier, NotificationSink};
use crate::geo::{Geocoder, HashGeocoder};
use crate::models::driver::Driver;
use crate::models::order::Order;
use crate::models::route::Route;
use crate::models::tracking::{DeliveryTracking, LocationUpdate, TrackingEvent};
use crate::models::GeoPoint;
use crate::observability::metrics::Metrics;

/// Backing stores plus injected capabilities. Each `DashMap` entry is the
/// unit of atomicity: a `get_mut` holds the record for the whole
/// read-modify-write, which is what keeps history appends lossless under
/// concurrent calls on the same tracking.
pub struct AppState {
    pub routes: DashMap<Uuid, Route>,
    pub orders: DashMap<Uuid, Order>,
    pub drivers: DashMap<Uuid, Driver>,
    pub trackings: DashMap<Uuid, DeliveryTracking>,
    pub locations: DashMap<Uuid, Vec<LocationUpdate>>,
    pub tracking_by_order: DashMap<Uuid, Uuid>,
    pub tracking_by_share_code: DashMap<String, Uuid>,
    pub tracking_events_tx: broadcast::Sender<TrackingEvent>,
    pub env: Arc<dyn EnvContext>,
    pub geocoder: Arc<dyn Geocoder>,
    pub notifier: Arc<dyn NotificationSink>,
    pub depot: GeoPoint,
    pub fuel_price_per_liter: f64,
    pub delivery_zone: Option<Vec<GeoPoint>>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        config: &Config,
        env: Arc<dyn EnvContext>,
        geocoder: Arc<dyn Geocoder>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let (tracking_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            routes: DashMap::new(),
            orders: DashMap::new(),
            drivers: DashMap::new(),
            trackings: DashMap::new(),
            locations: DashMap::new(),
            tracking_by_order: DashMap::new(),
            tracking_by_share_code: DashMap::new(),
            tracking_events_tx,
            env,
            geocoder,
            notifier,
            depot: GeoPoint {
                lat: config.depot_lat,
                lng: config.depot_lng,
            },
            fuel_price_per_liter: config.fuel_price_per_liter,
            delivery_zone: config.delivery_zone.clone(),
            metrics: Metrics::new(),
        }
    }

    pub fn with_defaults(config: &Config) -> Self {
        let depot = GeoPoint {
            lat: config.depot_lat,
            lng: config.depot_lng,
        };

        Self::new(
            config,
            Arc::new(SystemEnv::new(config.weather)),
            Arc::new(HashGeocoder::new(depot)),
            Arc::new(LogNotifier),
        )
    }
}
