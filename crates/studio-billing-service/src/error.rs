//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use studio_billing_core::{CostError, WpUserId};
use studio_billing_store::StoreError;

/// API error type.
///
/// Validation errors never touch the store; entitlement and business-rule
/// errors surface after the ledger rolled back; infrastructure errors are
/// logged with full detail server-side and reach the caller as an opaque
/// code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid input, rejected before any store access. The code
    /// distinguishes the wire-level reason (`MISSING_FIELDS`,
    /// `IMAGE_TOO_LARGE`, ...).
    #[error("{code}: {message}")]
    Validation {
        /// Machine-readable error code.
        code: &'static str,
        /// Human-readable detail.
        message: String,
    },

    /// Feature tag not in the price table and no explicit cost given.
    #[error("unknown feature type: {0}")]
    UnknownFeatureType(String),

    /// No user row for the external identity.
    #[error("user not found: {0}")]
    UserNotFound(WpUserId),

    /// Missing or inactive subscription blocks spending.
    #[error("subscription inactive: {0}")]
    SubscriptionInactive(WpUserId),

    /// No balance row for the user.
    #[error("balance not found: {0}")]
    BalanceNotFound(WpUserId),

    /// Balance below the requested debit.
    #[error("insufficient credits: remaining={credits_remaining}, required={required}")]
    InsufficientCredits {
        /// Credits currently remaining (echoed for caller display).
        credits_remaining: i64,
        /// Credits the debit required.
        required: i64,
    },

    /// The generation provider failed or returned an unusable payload.
    #[error("{code}: {detail}")]
    Upstream {
        /// Machine-readable error code.
        code: &'static str,
        /// Detail string (provider status, missing payload, ...).
        detail: String,
    },

    /// Store failure. The raw error stays in the server log.
    #[error("database error: {0}")]
    Database(String),

    /// Anything else that should not leak detail to the caller.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A `MISSING_FIELDS` validation error naming the absent fields.
    #[must_use]
    pub fn missing_fields(message: impl Into<String>) -> Self {
        Self::Validation {
            code: "MISSING_FIELDS",
            message: message.into(),
        }
    }

    /// A generic `BAD_REQUEST` validation error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation {
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Validation { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.clone(), None)
            }
            Self::UnknownFeatureType(tag) => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_FEATURE_TYPE",
                format!("unknown feature type: {tag}"),
                None,
            ),
            Self::UserNotFound(_) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", self.to_string(), None)
            }
            Self::SubscriptionInactive(_) => (
                StatusCode::FORBIDDEN,
                "SUBSCRIPTION_INACTIVE",
                self.to_string(),
                None,
            ),
            Self::BalanceNotFound(_) => (
                StatusCode::NOT_FOUND,
                "BALANCE_NOT_FOUND",
                self.to_string(),
                None,
            ),
            Self::InsufficientCredits {
                credits_remaining,
                required,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                "INSUFFICIENT_CREDITS",
                self.to_string(),
                Some(serde_json::json!({
                    "credits_remaining": credits_remaining,
                    "required": required
                })),
            ),
            Self::Upstream { code, detail } => {
                tracing::warn!(code = %code, detail = %detail, "Upstream provider error");
                (StatusCode::BAD_GATEWAY, *code, detail.clone(), None)
            }
            Self::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERROR",
                    "database operation failed".to_string(),
                    None,
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERVER_ERROR",
                    "an internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound { wp_user_id } => Self::UserNotFound(wp_user_id),
            StoreError::SubscriptionInactive { wp_user_id } => {
                Self::SubscriptionInactive(wp_user_id)
            }
            StoreError::BalanceNotFound { wp_user_id } => Self::BalanceNotFound(wp_user_id),
            StoreError::InsufficientCredits {
                remaining,
                required,
            } => Self::InsufficientCredits {
                credits_remaining: remaining,
                required,
            },
            StoreError::Database(msg) => Self::Database(msg),
        }
    }
}

impl From<CostError> for ApiError {
    fn from(err: CostError) -> Self {
        match err {
            CostError::UnknownFeatureType(tag) => Self::UnknownFeatureType(tag),
        }
    }
}

impl From<crate::novita::NovitaError> for ApiError {
    fn from(err: crate::novita::NovitaError) -> Self {
        Self::Upstream {
            code: "SERVER_ERROR",
            detail: err.to_string(),
        }
    }
}
