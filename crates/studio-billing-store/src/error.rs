//! Error types for studio-billing storage.

use studio_billing_core::WpUserId;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No user row exists for the external identity.
    #[error("user not found: {wp_user_id}")]
    UserNotFound {
        /// The identity that was not found.
        wp_user_id: WpUserId,
    },

    /// The user has no subscription, or the subscription is inactive.
    #[error("subscription inactive: {wp_user_id}")]
    SubscriptionInactive {
        /// The identity whose subscription blocks spending.
        wp_user_id: WpUserId,
    },

    /// The user has no credit balance row.
    #[error("balance not found: {wp_user_id}")]
    BalanceNotFound {
        /// The identity with no balance row.
        wp_user_id: WpUserId,
    },

    /// Balance is below the requested debit.
    #[error("insufficient credits: remaining={remaining}, required={required}")]
    InsufficientCredits {
        /// Credits currently remaining (for caller display).
        remaining: i64,
        /// Credits the debit required.
        required: i64,
    },

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(err.to_string())
    }
}
