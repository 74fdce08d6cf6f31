use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub optimizations_total: IntCounterVec,
    pub optimize_latency_seconds: HistogramVec,
    pub status_transitions_total: IntCounterVec,
    pub location_updates_total: IntCounterVec,
    pub active_trackings: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let optimizations_total = IntCounterVec::new(
            Opts::new("route_optimizations_total", "Route optimizations by outcome"),
            &["outcome"],
        )
        .expect("valid route_optimizations_total metric");

        let optimize_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "optimize_latency_seconds",
                "Latency of route optimization in seconds",
            ),
            &["outcome"],
        )
        .expect("valid optimize_latency_seconds metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Delivery status transitions by target status",
            ),
            &["status"],
        )
        .expect("valid status_transitions_total metric");

        let location_updates_total = IntCounterVec::new(
            Opts::new("location_updates_total", "Location updates by outcome"),
            &["outcome"],
        )
        .expect("valid location_updates_total metric");

        let active_trackings = IntGauge::new(
            "active_trackings",
            "Tracking records in a non-terminal status",
        )
        .expect("valid active_trackings metric");

        registry
            .register(Box::new(optimizations_total.clone()))
            .expect("register route_optimizations_total");
        registry
            .register(Box::new(optimize_latency_seconds.clone()))
            .expect("register optimize_latency_seconds");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(location_updates_total.clone()))
            .expect("register location_updates_total");
        registry
            .register(Box::new(active_trackings.clone()))
            .expect("register active_trackings");

        Self {
            registry,
            optimizations_total,
            optimize_latency_seconds,
            status_transitions_total,
            location_updates_total,
            active_trackings,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
