// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`RosaryError`] to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use rosary_core::RosaryError;
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error wrapper so `?` works on `RosaryError` inside handlers.
#[derive(Debug)]
pub struct ApiError(pub RosaryError);

impl From<RosaryError> for ApiError {
    fn from(err: RosaryError) -> Self {
        Self(err)
    }
}

fn json_error(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            err @ RosaryError::ContentMissing(_) => {
                tracing::error!(error = %err, "recitation content is missing");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            RosaryError::SessionStateInvalid(reason) => {
                tracing::debug!(%reason, "no usable recitation progress; back to dashboard");
                Redirect::to("/dashboard/").into_response()
            }
            RosaryError::NoMysteryToday { day } => (
                StatusCode::OK,
                Json(serde_json::json!({ "view": "missing_mystery", "day": day })),
            )
                .into_response(),
            RosaryError::Validation(message) => json_error(StatusCode::BAD_REQUEST, message),
            RosaryError::Unauthorized => {
                json_error(StatusCode::UNAUTHORIZED, "invalid username or password".into())
            }
            err => {
                tracing::error!(error = %err, "request failed");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".into(),
                )
            }
        }
    }
}
