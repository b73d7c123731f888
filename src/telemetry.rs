//! Telemetry logic.
//! Support metrics and request tracing.
//!
//! The Prometheus recorder is owned by [`Metrics`] and never installed as the
//! global recorder: every series is recorded through
//! [`metrics::with_local_recorder`], so two [`Metrics`] values never share
//! state.
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{FromRef, MatchedPath, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::IntoResponse;
use metrics::{Counter, Gauge, Unit};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

use crate::AppState;

/// Requests handled, per endpoint and method.
pub const REQUESTS_TOTAL: &str = "time_service_requests_total";
/// Requests handled by the time endpoint.
pub const TIME_REQUESTS_TOTAL: &str = "time_service_time_requests_total";
/// Seconds since the registry was created.
pub const UPTIME_SECONDS: &str = "time_service_uptime_seconds";
/// Handler latency, per endpoint, method and status.
pub const REQUEST_DURATION_SECONDS: &str = "time_service_request_duration_seconds";

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const EXPONENTIAL_SECONDS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Metrics register of one service instance.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<Inner>,
}

struct Inner {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    started_at: Instant,
    time_requests: Counter,
    uptime: Gauge,
}

impl Metrics {
    /// Create recorder for Prometheus metrics.
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                EXPONENTIAL_SECONDS,
            )?
            .build_recorder();
        let handle = recorder.handle();

        let (time_requests, uptime) = metrics::with_local_recorder(&recorder, || {
            metrics::describe_counter!(REQUESTS_TOTAL, "Total request count");
            metrics::describe_counter!(
                TIME_REQUESTS_TOTAL,
                "Time endpoint request count"
            );
            metrics::describe_gauge!(
                UPTIME_SECONDS,
                Unit::Seconds,
                "Service uptime in seconds"
            );
            metrics::describe_histogram!(
                REQUEST_DURATION_SECONDS,
                Unit::Seconds,
                "Request handling latency in seconds"
            );

            (
                metrics::counter!(TIME_REQUESTS_TOTAL),
                metrics::gauge!(UPTIME_SECONDS),
            )
        });

        Ok(Self {
            inner: Arc::new(Inner {
                recorder,
                handle,
                started_at: Instant::now(),
                time_requests,
                uptime,
            }),
        })
    }

    /// Count one request to `endpoint`.
    pub fn record_request(&self, endpoint: &'static str, method: &Method) {
        metrics::with_local_recorder(&self.inner.recorder, || {
            metrics::counter!(
                REQUESTS_TOTAL,
                "endpoint" => endpoint,
                "method" => method.to_string()
            )
            .increment(1);
        });
    }

    /// Count one request to the time endpoint.
    pub fn record_time_request(&self) {
        self.inner.time_requests.increment(1);
    }

    fn record_latency(&self, labels: [(&'static str, String); 3], latency: Duration) {
        metrics::with_local_recorder(&self.inner.recorder, || {
            metrics::histogram!(REQUEST_DURATION_SECONDS, &labels)
                .record(latency.as_secs_f64());
        });
    }

    /// Elapsed time since the registry was created.
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// Overwrite the uptime gauge with the current uptime.
    pub fn refresh_uptime(&self) -> f64 {
        let seconds = self.uptime().as_secs_f64();
        self.inner.uptime.set(seconds);
        seconds
    }

    /// Serialize every series in the text exposition format.
    pub fn render(&self) -> String {
        self.inner.handle.render()
    }
}

impl FromRef<AppState> for Metrics {
    fn from_ref(state: &AppState) -> Metrics {
        state.metrics.clone()
    }
}

/// Record latency of every routed request.
pub async fn track(
    State(metrics): State<Metrics>,
    req: Request,
    next: Next,
) -> impl IntoResponse {
    let start = Instant::now();
    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };
    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status().as_u16().to_string();

    tracing::debug!(
        %method,
        path = %path,
        status = %status,
        latency_us = latency.as_micros() as u64,
        "request handled"
    );

    let labels = [
        ("endpoint", path),
        ("method", method.to_string()),
        ("status", status),
    ];
    metrics.record_latency(labels, latency);

    response
}

/// Read one sample from a rendered exposition, ignoring label order.
#[cfg(test)]
pub(crate) fn sample(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    let mut wanted: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    wanted.sort();

    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let (series_name, found) = match series.split_once('{') {
                Some((series_name, rest)) => {
                    let mut found: Vec<(String, String)> = rest
                        .trim_end_matches('}')
                        .split(',')
                        .filter(|pair| !pair.is_empty())
                        .filter_map(|pair| {
                            let (k, v) = pair.split_once('=')?;
                            Some((k.to_owned(), v.trim_matches('"').to_owned()))
                        })
                        .collect();
                    found.sort();
                    (series_name, found)
                },
                None => (series, Vec::new()),
            };

            (series_name == name && found == wanted)
                .then(|| value.parse().ok())
                .flatten()
        })
}
