//! PostgreSQL storage layer for the studio-billing credit ledger.
//!
//! This crate owns the four ledger tables (`users`, `subscriptions`,
//! `credit_balances`, `usage_logs`) and exposes them through the [`Ledger`]
//! trait. Two implementations are provided:
//!
//! - [`PgLedger`] — sqlx/PostgreSQL, the production store. The debit
//!   transaction takes a row lock on the balance (`SELECT .. FOR UPDATE`) so
//!   concurrent debits for one user are linearizable.
//! - [`MemLedger`] — in-memory, for tests. A single async mutex over the
//!   whole state gives the same linearizability guarantee.
//!
//! # Example
//!
//! ```no_run
//! use studio_billing_core::WpUserId;
//! use studio_billing_store::{Ledger, MemLedger};
//!
//! # async fn demo() -> studio_billing_store::Result<()> {
//! let ledger = MemLedger::new();
//! let user_id = ledger
//!     .get_or_create_user(WpUserId::new(42), Some("user@example.com"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemLedger;
pub use postgres::PgLedger;

use async_trait::async_trait;

use studio_billing_core::{DebitOutcome, SubscriptionUpdate, UsageReport, UserId, WpUserId};

/// The ledger trait defining all store operations.
///
/// The backing store is the only synchronization point between requests;
/// every operation is a self-contained I/O-bound unit with store-dependent
/// latency. Implementations must guarantee that [`Ledger::debit`] is
/// linearizable per user.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Map an external identity to the internal user id, creating the user
    /// row if absent.
    ///
    /// Idempotent and safe under concurrent calls for the same identity: at
    /// most one row is ever created. A supplied email updates the stored one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn get_or_create_user(
        &self,
        wp_user_id: WpUserId,
        email: Option<&str>,
    ) -> Result<UserId>;

    /// Look up an existing user without creating one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn find_user(&self, wp_user_id: WpUserId) -> Result<Option<UserId>>;

    /// Make a subscription-update notification authoritative.
    ///
    /// Get-or-creates the user, upserts the subscription keyed by user, and
    /// upserts the balance keyed by user — **resetting** `credits_remaining`
    /// to the new monthly limit. A mid-cycle re-ingestion wipes partial
    /// usage; applying the same payload twice ends in the same state as
    /// applying it once.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn upsert_subscription(&self, update: &SubscriptionUpdate) -> Result<UserId>;

    /// Atomically verify entitlement and sufficiency, decrement the balance,
    /// and append a usage record.
    ///
    /// Preconditions are checked in order, each a typed rejection:
    /// user exists, subscription active, balance row exists,
    /// `credits_remaining >= cost`. Any failure leaves all rows unchanged —
    /// no log entry, no decrement.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UserNotFound`] — no user row for the identity.
    /// - [`StoreError::SubscriptionInactive`] — missing or inactive
    ///   subscription.
    /// - [`StoreError::BalanceNotFound`] — no balance row.
    /// - [`StoreError::InsufficientCredits`] — balance below `cost`; carries
    ///   the current remaining balance.
    async fn debit(
        &self,
        wp_user_id: WpUserId,
        feature_type: &str,
        cost: i64,
        metadata: serde_json::Value,
    ) -> Result<DebitOutcome>;

    /// Read-only projection of a user's entitlement plus the most recent
    /// `recent_limit` usage entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the identity has no user row.
    /// Absent subscription or balance rows report as zeroed/null fields.
    async fn usage_report(&self, wp_user_id: WpUserId, recent_limit: i64) -> Result<UsageReport>;

    /// Liveness probe: one cheap round trip, no transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    async fn ping(&self) -> Result<()>;
}
