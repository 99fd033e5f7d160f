use crate::errors::Result;
use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, IntGauge, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref REQUESTS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "endpoint_requests_total",
        "Total read and write requests received"
    ))
    .unwrap();
    pub static ref READINGS_INSERTED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "endpoint_readings_inserted_total",
        "Total temperature rows written"
    ))
    .unwrap();
    pub static ref AUTH_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "endpoint_auth_failures_total",
        "Total write requests rejected for a wrong secret"
    ))
    .unwrap();
    pub static ref VALIDATION_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "endpoint_validation_failures_total",
        "Total write requests rejected for a malformed body or temperature"
    ))
    .unwrap();
    pub static ref STORAGE_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "endpoint_storage_failures_total",
        "Total requests that failed in the database"
    ))
    .unwrap();
    pub static ref QUERY_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "endpoint_query_latency_seconds",
            "Time from connection acquire to statement completion"
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0
        ])
    )
    .unwrap();
    pub static ref CONNECTIONS_CHECKED_OUT: IntGauge = IntGauge::with_opts(Opts::new(
        "endpoint_connections_checked_out",
        "Database connections currently held by requests"
    ))
    .unwrap();
}

pub fn init_metrics() -> Result<()> {
    REGISTRY.register(Box::new(REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(READINGS_INSERTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(AUTH_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VALIDATION_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STORAGE_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(QUERY_LATENCY_SECONDS.clone()))?;
    REGISTRY.register(Box::new(CONNECTIONS_CHECKED_OUT.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
