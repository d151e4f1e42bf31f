//! `GET /metrics`

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// Register help texts with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        "parking_operations_total",
        "Lifecycle operations by operation and outcome (applied or skip reason)"
    );
    describe_gauge!("sector_occupied", "Vehicles currently parked per sector");
    describe_counter!(
        "reconciliation_polls_total",
        "Garage feed polls by result"
    );
    describe_counter!("http_requests_total", "HTTP requests by method, route and status");
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request latency by method and route"
    );
}

pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}
