//! Prometheus scrape endpoint.

use axum::extract::State;
use axum::http::{Method, header};
use axum::response::IntoResponse;

use crate::telemetry::{CONTENT_TYPE, Metrics};

/// Refresh uptime, then dump the whole register.
pub async fn handler(State(metrics): State<Metrics>, method: Method) -> impl IntoResponse {
    metrics.record_request("/metrics", &method);
    metrics.refresh_uptime();

    ([(header::CONTENT_TYPE, CONTENT_TYPE)], metrics.render())
}
