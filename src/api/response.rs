//! Response types for the Tip Pool Engine API.
//!
//! This module defines the error body shared by every endpoint and the
//! mapping from [`EngineError`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates an invalid query string error response.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new("INVALID_QUERY", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A `400 Bad Request` with the given body.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, code) = match &error {
            EngineError::RuleNotFound { .. } => (StatusCode::NOT_FOUND, "RULE_NOT_FOUND"),
            EngineError::PoolNotFound { .. } => (StatusCode::NOT_FOUND, "POOL_NOT_FOUND"),
            EngineError::PayoutNotFound { .. } => (StatusCode::NOT_FOUND, "PAYOUT_NOT_FOUND"),
            EngineError::DisputeNotFound { .. } => (StatusCode::NOT_FOUND, "DISPUTE_NOT_FOUND"),
            EngineError::NoTipsForDate { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_TIPS_FOR_DATE")
            }
            EngineError::NoShiftsForDate { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_SHIFTS_FOR_DATE")
            }
            EngineError::InvalidDistributionRule { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_DISTRIBUTION_RULE")
            }
            EngineError::PoolFinalized { .. } => (StatusCode::CONFLICT, "POOL_FINALIZED"),
            EngineError::DisputeClosed { .. } => (StatusCode::CONFLICT, "DISPUTE_CLOSED"),
            EngineError::InvalidShift { .. } => (StatusCode::BAD_REQUEST, "INVALID_SHIFT"),
            EngineError::InvalidDateRange { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_DATE_RANGE")
            }
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR")
            }
            EngineError::Store(_) => {
                // storage internals stay in the logs
                return ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::new("STORAGE_ERROR", "Storage operation failed"),
                };
            }
        };

        let body = match &error {
            EngineError::InvalidDistributionRule { role, .. } => {
                ApiError::with_details(code, message, format!("role: {}", role))
            }
            _ => ApiError::new(code, message),
        };

        ApiErrorResponse {
            status,
            error: body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use chrono::NaiveDate;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_invalid_rule_errors_name_the_role_in_details() {
        let api_error: ApiErrorResponse = EngineError::InvalidDistributionRule {
            role: "busser".to_string(),
            message: "multiplier is negative".to_string(),
        }
        .into();
        assert_eq!(api_error.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api_error.error.details.as_deref(), Some("role: busser"));
        let json = serde_json::to_string(&api_error.error).unwrap();
        assert!(json.contains("\"details\":\"role: busser\""));
    }

    #[test]
    fn test_not_found_errors_map_to_404() {
        let api_error: ApiErrorResponse = EngineError::PoolNotFound { pool_id: 12 }.into();
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.error.code, "POOL_NOT_FOUND");
        assert!(api_error.error.message.contains("12"));
    }

    #[test]
    fn test_missing_inputs_map_to_422() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let api_error: ApiErrorResponse = EngineError::NoTipsForDate { date }.into();
        assert_eq!(api_error.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api_error.error.code, "NO_TIPS_FOR_DATE");
    }

    #[test]
    fn test_store_errors_hide_internals() {
        let api_error: ApiErrorResponse =
            EngineError::Store(StoreError::Backend("connection reset".to_string())).into();
        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_error.error.message.contains("connection reset"));
    }
}
