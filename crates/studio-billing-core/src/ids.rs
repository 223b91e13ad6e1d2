//! Identifier types for studio-billing.
//!
//! User identities are issued externally (WordPress user ids carried on every
//! request). The entitlement resolver maps them to internal row ids on first
//! contact; both sides get their own newtype so they cannot be swapped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An externally-issued user identity (the WordPress user id).
///
/// This is the identity callers present on every ledger operation. It is
/// stable for the lifetime of the user and unique across the platform.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WpUserId(i64);

impl WpUserId {
    /// Create a `WpUserId` from a raw integer.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Return the raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl FromStr for WpUserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| IdError::InvalidUserId(s.to_string()))
    }
}

impl fmt::Debug for WpUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WpUserId({})", self.0)
    }
}

impl fmt::Display for WpUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An internal user row id, assigned by the store.
///
/// Never exposed to callers except in the subscription-ingestion response,
/// which mirrors what the billing system expects back.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a `UserId` from a raw row id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Return the raw row id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when parsing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The value could not be parsed as a user id.
    #[error("invalid user id: {0}")]
    InvalidUserId(String),
}
