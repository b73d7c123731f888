//! Error handler for the time service.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to encode response body")]
    Serialize(#[from] serde_json::Error),
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = match &self {
            ServerError::Serialize(err) => {
                tracing::error!(error = %err, "server returned 500 status");

                ResponseError::default()
                    .title("Server error during response encoding.")
                    .details(&self.to_string())
            },
        };

        response
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
