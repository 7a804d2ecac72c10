use crate::config::ConfigError;
use crate::fraud::FraudError;
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
    Scenario(serde_json::Error),
    Fraud(FraudError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Scenario(err) => write!(f, "invalid scenario: {}", err),
            AppError::Fraud(err) => write!(f, "fraud error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Scenario(err) => Some(err),
            AppError::Fraud(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Fraud(err) => err.status_code(),
            AppError::Scenario(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
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

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Scenario(value)
    }
}

impl From<FraudError> for AppError {
    fn from(value: FraudError) -> Self {
        Self::Fraud(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraud::{FraudCheckType, FraudStatus, UserId};

    #[test]
    fn fraud_errors_keep_their_status() {
        let conflict = AppError::from(FraudError::AlreadyStarted {
            check_type: FraudCheckType::Ubble,
            third_party_id: "idv_1".to_string(),
        });
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let missing = AppError::from(FraudError::UserNotFound(UserId(4)));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let reason = AppError::from(FraudError::MissingReason(FraudStatus::Ko));
        assert_eq!(
            reason.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn malformed_scenarios_are_bad_requests() {
        let error = match serde_json::from_str::<serde_json::Value>("{") {
            Err(error) => AppError::from(error),
            Ok(value) => panic!("expected a parse error, got {value}"),
        };
        assert!(error.to_string().starts_with("invalid scenario"));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
