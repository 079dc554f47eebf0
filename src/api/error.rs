//! HTTP mapping of [`Error`].
//!
//! Validation failures become 400 with a `non_field_errors` list (or a list
//! keyed by the field), missing records 404, credential problems 401 and
//! anything else 500.

use crate::errors::Error;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::Validation { message } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "non_field_errors": [message] })),
            )
                .into_response(),
            Self::LinesRejected { .. } | Self::InvalidPrice { .. } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "non_field_errors": [self.to_string()] })),
            )
                .into_response(),
            Self::FieldValidation { field, message } => {
                let mut body = serde_json::Map::new();
                body.insert(field, json!([message]));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::UserNotFound { .. }
            | Self::MenuItemNotFound { .. }
            | Self::OrderNotFound { .. }
            | Self::OrderLineNotFound { .. }
            | Self::InvalidId { .. } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Not found." })),
            )
                .into_response(),
            Self::InvalidPage { .. } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Invalid page." })),
            )
                .into_response(),
            Self::Unauthorized { message } => {
                let mut response =
                    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": message }))).into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
                response
            }
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "A server error occurred." })),
                )
                    .into_response()
            }
        }
    }
}
