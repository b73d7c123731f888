//! Current time in several formats.
//!
//! Path: /time?tz=ZONE&pretty=true
//!
//! `tz` defaults to `UTC`. An unknown zone is not an error: local fields are
//! computed in UTC while `timezone` still echoes the requested identifier.

use axum::extract::{Query, State};
use axum::http::{Method, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::timezone;

const DEFAULT_TIMEZONE: &str = "UTC";

/// Recognized query parameters.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Params {
    tz: Option<String>,
    pretty: Option<String>,
}

impl Params {
    /// First occurrence of a key wins, unknown keys are ignored.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        pairs
            .into_iter()
            .fold(Self::default(), |mut params, (key, value)| {
                match key.as_str() {
                    "tz" if params.tz.is_none() => params.tz = Some(value),
                    "pretty" if params.pretty.is_none() => params.pretty = Some(value),
                    _ => (),
                }
                params
            })
    }

    fn timezone(&self) -> &str {
        self.tz.as_deref().unwrap_or(DEFAULT_TIMEZONE)
    }

    fn pretty(&self) -> bool {
        self.pretty
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeInfo {
    pub unix_timestamp: i64,
    pub iso_8601: String,
    pub utc: String,
    pub local_time: String,
    pub timezone: String,
    pub hostname: String,
    pub service_name: String,
}

pub async fn handler(
    State(state): State<AppState>,
    method: Method,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    state.metrics.record_request("/time", &method);
    state.metrics.record_time_request();

    let params = Params::from_pairs(pairs);
    let now = state.clock.now();
    let formatted = timezone::format(now, timezone::resolve(params.timezone()));

    let info = TimeInfo {
        unix_timestamp: now.timestamp(),
        iso_8601: formatted.iso_8601,
        utc: formatted.utc,
        local_time: formatted.local_time,
        timezone: params.timezone().to_owned(),
        hostname: state.hostname.to_string(),
        service_name: crate::SERVICE_NAME.to_owned(),
    };

    let body = if params.pretty() {
        serde_json::to_vec_pretty(&info)?
    } else {
        serde_json::to_vec(&info)?
    };

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;

    async fn get_time(state: &AppState, path: &str) -> (TimeInfo, String) {
        let response = make_request(app(state.clone()), Method::GET, path).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let raw = String::from_utf8(body.to_vec()).unwrap();
        (serde_json::from_str(&raw).unwrap(), raw)
    }

    #[test]
    fn test_params() {
        let params = Params::from_pairs(vec![
            ("pretty".into(), "TRUE".into()),
            ("tz".into(), "Europe/Paris".into()),
            ("tz".into(), "Asia/Tokyo".into()),
            ("unused".into(), "1".into()),
        ]);
        assert_eq!(params.timezone(), "Europe/Paris");
        assert!(params.pretty());

        let params = Params::from_pairs(Vec::new());
        assert_eq!(params.timezone(), "UTC");
        assert!(!params.pretty());

        for value in ["false", "1", "yes", ""] {
            let params = Params::from_pairs(vec![("pretty".into(), value.into())]);
            assert!(!params.pretty(), "{value:?} must be falsy");
        }
    }

    #[tokio::test]
    async fn test_time_defaults() {
        let state = test_state();
        let (info, _) = get_time(&state, "/time").await;

        assert_eq!(
            info,
            TimeInfo {
                unix_timestamp: 1_700_000_000,
                iso_8601: "2023-11-14T22:13:20".into(),
                utc: "2023-11-14T22:13:20".into(),
                local_time: "2023-11-14 22:13:20 UTC".into(),
                timezone: "UTC".into(),
                hostname: "test-host".into(),
                service_name: "mcp-time".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_time_with_system_clock() {
        let state = AppState {
            clock: std::sync::Arc::new(clock::SystemClock::new()),
            ..test_state()
        };
        let (info, _) = get_time(&state, "/time").await;

        let now = chrono::Utc::now().timestamp();
        assert!((now - info.unix_timestamp).abs() <= 1);
        assert_eq!(info.timezone, "UTC");
    }

    #[tokio::test]
    async fn test_time_with_timezone() {
        let state = test_state();
        let (info, _) = get_time(&state, "/time?tz=Europe/Paris").await;

        assert_eq!(info.timezone, "Europe/Paris");
        assert_eq!(info.iso_8601, "2023-11-14T23:13:20");
        assert_eq!(info.utc, "2023-11-14T22:13:20");
        assert_eq!(info.local_time, "2023-11-14 23:13:20 CET");
        assert_eq!(info.unix_timestamp, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_time_with_unknown_timezone() {
        let state = test_state();
        let (info, _) = get_time(&state, "/time?tz=Not/AZone").await;

        assert_eq!(info.timezone, "Not/AZone");
        assert_eq!(info.local_time, "2023-11-14 22:13:20 UTC");
    }

    #[tokio::test]
    async fn test_time_pretty() {
        let state = test_state();
        let (pretty, pretty_raw) = get_time(&state, "/time?pretty=true").await;
        let (compact, compact_raw) = get_time(&state, "/time?pretty=false").await;

        assert_eq!(pretty, compact);
        assert_ne!(pretty_raw, compact_raw);
        assert!(pretty_raw.contains("\n  \"unix_timestamp\": 1700000000"));
        assert!(!compact_raw.contains('\n'));
        assert!(compact_raw.starts_with(r#"{"unix_timestamp":1700000000,"iso_8601":"#));
    }

    #[tokio::test]
    async fn test_concurrent_timezones() {
        let state = test_state();
        let zones = [
            ("Europe/Paris", "CET"),
            ("Asia/Tokyo", "JST"),
            ("America/New_York", "EST"),
            ("UTC", "UTC"),
        ];

        let tasks = zones.iter().cycle().take(32).map(|&(zone, abbreviation)| {
            let state = state.clone();
            tokio::spawn(async move {
                let (info, _) = get_time(&state, &format!("/time?tz={zone}")).await;
                assert_eq!(info.timezone, zone);
                assert!(info.local_time.ends_with(abbreviation));
            })
        });

        for task in tasks.collect::<Vec<_>>() {
            task.await.unwrap();
        }
    }
}
