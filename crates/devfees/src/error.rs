use crate::config::ConfigError;
use crate::fees::{ComparisonError, ScheduleImportError, SourceError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Schedule(ScheduleImportError),
    Source(SourceError),
    Comparison(ComparisonError),
    InvalidRequest(String),
    TaskFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Schedule(err) => write!(f, "fee schedule error: {}", err),
            AppError::Source(err) => write!(f, "fee source error: {}", err),
            AppError::Comparison(err) => write!(f, "comparison error: {}", err),
            AppError::InvalidRequest(message) => write!(f, "invalid request: {}", message),
            AppError::TaskFailed(message) => write!(f, "background task failed: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Schedule(err) => Some(err),
            AppError::Source(err) => Some(err),
            AppError::Comparison(err) => Some(err),
            AppError::InvalidRequest(_) | AppError::TaskFailed(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRequest(_)
            | AppError::Comparison(ComparisonError::NotEnoughJurisdictions { .. }) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Source(SourceError::UnknownJurisdiction(_))
            | AppError::Comparison(ComparisonError::Fetch {
                source: SourceError::UnknownJurisdiction(_),
                ..
            }) => StatusCode::NOT_FOUND,
            AppError::Source(SourceError::NoFees(_))
            | AppError::Comparison(ComparisonError::Fetch {
                source: SourceError::NoFees(_),
                ..
            }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Source(SourceError::Unavailable(_))
            | AppError::Comparison(ComparisonError::Fetch {
                source: SourceError::Unavailable(_),
                ..
            }) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Schedule(_)
            | AppError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ScheduleImportError> for AppError {
    fn from(value: ScheduleImportError) -> Self {
        Self::Schedule(value)
    }
}

impl From<SourceError> for AppError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<ComparisonError> for AppError {
    fn from(value: ComparisonError) -> Self {
        Self::Comparison(value)
    }
}
