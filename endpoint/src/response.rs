use crate::errors::Error;
use crate::metrics::{AUTH_FAILURES_TOTAL, STORAGE_FAILURES_TOTAL, VALIDATION_FAILURES_TOTAL};
use crate::model::TemperatureReading;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

fn plain_text(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

/// Response for a completed insert.
pub fn inserted(rows: u64) -> Response {
    plain_text(StatusCode::OK, format!("Success: {} rows", rows))
}

/// Response for a completed read: the rows as a JSON array, served as plain text.
pub fn readings(rows: &[TemperatureReading]) -> Response {
    match serde_json::to_string(rows) {
        Ok(body) => plain_text(StatusCode::OK, body),
        Err(e) => Error::Json(e).into_response(),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Auth => {
                AUTH_FAILURES_TOTAL.inc();
                warn!("Rejected write: {}", self);
                StatusCode::UNAUTHORIZED
            }
            Error::Validation(_) => {
                VALIDATION_FAILURES_TOTAL.inc();
                warn!("Rejected write: {}", self);
                StatusCode::BAD_REQUEST
            }
            Error::Storage(_) => {
                STORAGE_FAILURES_TOTAL.inc();
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::Config(_) | Error::Json(_) | Error::Metrics(_) => {
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        plain_text(status, format!("Error: {}", self.public_message()))
    }
}
