//! Liveness probe.

use axum::Json;
use axum::extract::State;
use axum::http::Method;
use serde::Serialize;

use crate::telemetry::Metrics;

#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
}

/// Always healthy while the process answers.
pub async fn handler(State(metrics): State<Metrics>, method: Method) -> Json<Health> {
    metrics.record_request("/health", &method);

    Json(Health { status: "healthy" })
}
