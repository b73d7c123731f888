//! Service descriptor.

use axum::Json;
use axum::extract::State;
use axum::http::Method;
use serde::Serialize;

use crate::telemetry::Metrics;

const DESCRIPTION: &str = "Time service for MCP stack";

/// Structured service description.
#[derive(Debug, Serialize)]
pub struct Index {
    service: &'static str,
    version: &'static str,
    description: &'static str,
    endpoints: [Endpoint; 3],
}

#[derive(Debug, Serialize)]
pub struct Endpoint {
    path: &'static str,
    description: &'static str,
}

/// Public service description and endpoint list.
pub async fn handler(State(metrics): State<Metrics>, method: Method) -> Json<Index> {
    metrics.record_request("/", &method);

    Json(Index {
        service: crate::SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        description: DESCRIPTION,
        endpoints: [
            Endpoint {
                path: "/time",
                description: "Get current time information",
            },
            Endpoint {
                path: "/metrics",
                description: "Prometheus metrics",
            },
            Endpoint {
                path: "/health",
                description: "Health check",
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use crate::telemetry::{REQUESTS_TOTAL, sample};
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_index_handler() {
        let state = test_state();
        let response = make_request(app(state.clone()), Method::GET, "/").await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["service"], "mcp-time");
        assert_eq!(body["version"], "1.0.0");
        assert_eq!(body["description"], "Time service for MCP stack");

        let endpoints = body["endpoints"].as_array().unwrap();
        assert_eq!(endpoints.len(), 3);
        for endpoint in endpoints {
            assert!(!endpoint["path"].as_str().unwrap().is_empty());
            assert!(!endpoint["description"].as_str().unwrap().is_empty());
        }
        let paths: Vec<_> = endpoints.iter().map(|e| e["path"].as_str().unwrap()).collect();
        assert_eq!(paths, ["/time", "/metrics", "/health"]);

        assert_eq!(
            sample(
                &state.metrics.render(),
                REQUESTS_TOTAL,
                &[("endpoint", "/"), ("method", "GET")]
            ),
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let response = make_request(app(test_state()), Method::GET, "/clock").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
