//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::{ErrorContext, RepositoryError};
use crate::db::ServiceError;
use crate::services::aggregate::AggregationError;
use crate::services::forecast::ForecastError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Well-formed request the data cannot satisfy, e.g. a series too short to fit
    Unprocessable(String),
    /// Work did not finish within its time budget
    Timeout(String),
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Repository(e) => match e {
                RepositoryError::NotFound { .. } => StatusCode::NOT_FOUND,
                RepositoryError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::NotFound(msg) => ApiError::new("NOT_FOUND", msg),
            AppError::BadRequest(msg) => ApiError::new("BAD_REQUEST", msg),
            AppError::Unprocessable(msg) => ApiError::new("UNPROCESSABLE", msg),
            AppError::Timeout(msg) => ApiError::new("TIMEOUT", msg),
            AppError::Internal(msg) => ApiError::new("INTERNAL_ERROR", msg),
            AppError::Repository(e) => {
                let code = match e {
                    RepositoryError::NotFound { .. } => "NOT_FOUND",
                    RepositoryError::ValidationError { .. } => "BAD_REQUEST",
                    _ => "REPOSITORY_ERROR",
                };
                let error = ApiError::new(code, e.message());
                if *e.context() == ErrorContext::default() {
                    error
                } else {
                    error.with_details(e.context().to_string())
                }
            }
        };

        if status.is_server_error() {
            tracing::warn!("{} {}: {}", status.as_u16(), error.code, error.message);
        }

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<AggregationError> for AppError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::UnknownDistrict(_) => AppError::NotFound(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::UnknownSeries(_) => AppError::NotFound(err.to_string()),
            ForecastError::InvalidHorizon { .. } => AppError::BadRequest(err.to_string()),
            ForecastError::InsufficientHistory { .. } | ForecastError::FitFailed { .. } => {
                AppError::Unprocessable(err.to_string())
            }
            ForecastError::Timeout(_) => AppError::Timeout(err.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Repository(e) => e.into(),
            ServiceError::Aggregation(e) => e.into(),
            ServiceError::Forecast(e) => e.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_errors_map_to_status() {
        let cases = [
            (ForecastError::UnknownSeries("W9__X".into()), StatusCode::NOT_FOUND),
            (ForecastError::InvalidHorizon { h: 0, max: 104 }, StatusCode::BAD_REQUEST),
            (
                ForecastError::InsufficientHistory {
                    required: 8,
                    available: 3,
                    purpose: "fit".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ForecastError::Timeout(30), StatusCode::GATEWAY_TIMEOUT),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_repository_errors_map_by_variant() {
        let not_found: AppError = RepositoryError::not_found("District Goa").into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid: AppError = RepositoryError::validation("empty name").into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let internal: AppError = RepositoryError::internal("lock poisoned").into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_service_error_delegates() {
        let err: AppError =
            ServiceError::Aggregation(AggregationError::UnknownDistrict("Goa".into())).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_api_error_details_skipped_when_absent() {
        let json = serde_json::to_value(ApiError::new("NOT_FOUND", "missing")).unwrap();
        assert!(json.get("details").is_none());

        let json = serde_json::to_value(ApiError::new("X", "y").with_details("z")).unwrap();
        assert_eq!(json["details"], "z");
    }
}
