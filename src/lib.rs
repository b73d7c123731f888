//! mcp-time reports the current time in several formats and exposes
//! Prometheus metrics about itself.

#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod error;
mod router;
pub mod telemetry;
pub mod timezone;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::http::Method;
use axum::middleware as AxumMiddleware;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};

/// Name reported by `/` and `/time`.
pub const SERVICE_NAME: &str = "mcp-time";
/// Hostname used when the OS cannot report one.
pub const UNKNOWN_HOSTNAME: &str = "unknown";

/// MUST NEVER be used in production.
#[cfg(test)]
pub(crate) async fn make_request(
    app: Router,
    method: Method,
    path: &str,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State pinned to 2023-11-14T22:13:20Z with a fresh metrics register.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    AppState {
        metrics: telemetry::Metrics::new().unwrap(),
        clock: Arc::new(clock::FixedClock::new(1_700_000_000, 0)),
        hostname: "test-host".into(),
    }
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub metrics: telemetry::Metrics,
    pub clock: Arc<dyn clock::Clock>,
    pub hostname: Arc<str>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().latency_unit(LatencyUnit::Micros)),
        )
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers(Any),
        );

    Router::new()
        // `GET /` goes to `index`.
        .route("/", get(router::index::handler))
        .route("/health", get(router::health::handler))
        .route("/time", get(router::time::handler))
        .route("/metrics", get(router::metrics::handler))
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.metrics.clone(),
            telemetry::track,
        ))
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
pub fn initialize_state() -> Result<AppState, metrics_exporter_prometheus::BuildError> {
    let metrics = telemetry::Metrics::new()?;

    Ok(AppState {
        metrics,
        clock: Arc::new(clock::SystemClock::new()),
        hostname: hostname().into(),
    })
}

/// Host name as reported by the OS.
pub fn hostname() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| {
        tracing::warn!(
            fallback = UNKNOWN_HOSTNAME,
            "cannot read hostname from operating system"
        );
        UNKNOWN_HOSTNAME.to_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header};

    #[test]
    fn test_hostname_is_not_empty() {
        assert!(!hostname().is_empty());
    }

    #[test]
    fn test_initialize_state() {
        let state = initialize_state().unwrap();
        assert_eq!(&*state.hostname, hostname());
        assert!(state.metrics.uptime() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        use axum::extract::Request;
        use tower::util::ServiceExt;

        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/time")
                    .header(header::ORIGIN, "https://example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
