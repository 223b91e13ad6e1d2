//! PostgreSQL ledger implementation.
//!
//! All coordination between concurrent requests happens here, in the
//! database: the debit transaction reads the balance with `FOR UPDATE` so
//! two debits against the same user serialize on the row lock, and the
//! ingestion upserts take the same lock, so a reset and a debit for one user
//! never interleave into a corrupted state.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use studio_billing_core::{
    DebitOutcome, SubscriptionUpdate, UsageLogEntry, UsageReport, UserId, WpUserId,
};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::Ledger;

/// PostgreSQL-backed ledger.
///
/// Holds a bounded connection pool; every operation acquires one connection
/// for its duration and releases it on every exit path (sqlx transactions
/// roll back on drop, so an early `?` return can never leak an open
/// transaction).
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    /// Connect to PostgreSQL with a bounded pool.
    ///
    /// `acquire_timeout` bounds how long an operation waits for a free
    /// connection; `statement_timeout` is installed server-side so a hung
    /// query aborts (and its transaction rolls back) instead of holding a
    /// row lock forever.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the server is
    /// unreachable.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
        statement_timeout: Duration,
    ) -> Result<Self> {
        let options = PgConnectOptions::from_str(database_url)?
            .options([("statement_timeout", statement_timeout.as_millis().to_string())]);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests that manage their own pool).
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails to apply.
    pub async fn migrate(&self) -> Result<()> {
        schema::MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// The underlying pool handle.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl Ledger for PgLedger {
    async fn get_or_create_user(
        &self,
        wp_user_id: WpUserId,
        email: Option<&str>,
    ) -> Result<UserId> {
        // Conflict-safe insert-or-fetch: the unique constraint on wp_user_id
        // serializes concurrent first contacts, and DO UPDATE makes RETURNING
        // yield the row id on both paths.
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO users (wp_user_id, email)
            VALUES ($1, $2)
            ON CONFLICT (wp_user_id)
            DO UPDATE SET email = COALESCE(EXCLUDED.email, users.email)
            RETURNING id
            ",
        )
        .bind(wp_user_id.get())
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserId::new(id))
    }

    async fn find_user(&self, wp_user_id: WpUserId) -> Result<Option<UserId>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE wp_user_id = $1")
            .bind(wp_user_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(id.map(UserId::new))
    }

    async fn upsert_subscription(&self, update: &SubscriptionUpdate) -> Result<UserId> {
        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO users (wp_user_id, email)
            VALUES ($1, $2)
            ON CONFLICT (wp_user_id)
            DO UPDATE SET email = COALESCE(EXCLUDED.email, users.email)
            RETURNING id
            ",
        )
        .bind(update.wp_user_id.get())
        .bind(update.email.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO subscriptions
                (user_id, plan_id, monthly_credit_limit, cycle_start, cycle_end, active, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (user_id) DO UPDATE SET
                plan_id = EXCLUDED.plan_id,
                monthly_credit_limit = EXCLUDED.monthly_credit_limit,
                cycle_start = EXCLUDED.cycle_start,
                cycle_end = EXCLUDED.cycle_end,
                active = EXCLUDED.active,
                updated_at = now()
            ",
        )
        .bind(user_id)
        .bind(update.plan_id)
        .bind(update.monthly_credit_limit)
        .bind(update.cycle_start)
        .bind(update.cycle_end)
        .bind(update.active)
        .execute(&mut *tx)
        .await?;

        // Hard reset to the new monthly limit; the upsert's row lock
        // serializes against any in-flight debit on the same user.
        sqlx::query(
            r"
            INSERT INTO credit_balances (user_id, cycle_start, credits_remaining, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (user_id) DO UPDATE SET
                cycle_start = EXCLUDED.cycle_start,
                credits_remaining = EXCLUDED.credits_remaining,
                updated_at = now()
            ",
        )
        .bind(user_id)
        .bind(update.cycle_start)
        .bind(update.monthly_credit_limit)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            wp_user_id = %update.wp_user_id,
            user_id = %user_id,
            plan_id = %update.plan_id,
            monthly_credit_limit = %update.monthly_credit_limit,
            active = %update.active,
            "Subscription ingested, balance reset"
        );

        Ok(UserId::new(user_id))
    }

    async fn debit(
        &self,
        wp_user_id: WpUserId,
        feature_type: &str,
        cost: i64,
        metadata: serde_json::Value,
    ) -> Result<DebitOutcome> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE wp_user_id = $1")
            .bind(wp_user_id.get())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(user_id) = user_id else {
            tx.rollback().await?;
            return Err(StoreError::UserNotFound { wp_user_id });
        };

        let active: Option<bool> =
            sqlx::query_scalar("SELECT active FROM subscriptions WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        if !active.unwrap_or(false) {
            tx.rollback().await?;
            return Err(StoreError::SubscriptionInactive { wp_user_id });
        }

        // Locking read: concurrent debits for this user queue here, so the
        // compare below always sees the committed balance.
        let remaining: Option<i64> = sqlx::query_scalar(
            "SELECT credits_remaining FROM credit_balances WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(remaining) = remaining else {
            tx.rollback().await?;
            return Err(StoreError::BalanceNotFound { wp_user_id });
        };

        if remaining < cost {
            tx.rollback().await?;
            return Err(StoreError::InsufficientCredits {
                remaining,
                required: cost,
            });
        }

        let credits_remaining: i64 = sqlx::query_scalar(
            r"
            UPDATE credit_balances
            SET credits_remaining = credits_remaining - $1, updated_at = now()
            WHERE user_id = $2
            RETURNING credits_remaining
            ",
        )
        .bind(cost)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO usage_logs (user_id, feature_type, credits_spent, metadata)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(user_id)
        .bind(feature_type)
        .bind(cost)
        .bind(metadata)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            wp_user_id = %wp_user_id,
            feature_type = %feature_type,
            charged = %cost,
            credits_remaining = %credits_remaining,
            "Debit committed"
        );

        Ok(DebitOutcome {
            credits_remaining,
            charged: cost,
        })
    }

    async fn usage_report(&self, wp_user_id: WpUserId, recent_limit: i64) -> Result<UsageReport> {
        let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE wp_user_id = $1")
            .bind(wp_user_id.get())
            .fetch_optional(&self.pool)
            .await?;

        let Some(user_id) = user_id else {
            return Err(StoreError::UserNotFound { wp_user_id });
        };

        let subscription: Option<(i64, i64, bool, NaiveDate)> = sqlx::query_as(
            r"
            SELECT plan_id, monthly_credit_limit, active, cycle_end
            FROM subscriptions
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let balance: Option<(i64, Option<NaiveDate>)> = sqlx::query_as(
            "SELECT credits_remaining, cycle_start FROM credit_balances WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let rows: Vec<(String, i64, serde_json::Value, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT feature_type, credits_spent, metadata, created_at
            FROM usage_logs
            WHERE user_id = $1
            ORDER BY id DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(recent_limit)
        .fetch_all(&self.pool)
        .await?;

        let recent_usage = rows
            .into_iter()
            .map(
                |(feature_type, credits_spent, metadata, created_at)| UsageLogEntry {
                    feature_type,
                    credits_spent,
                    metadata,
                    created_at,
                },
            )
            .collect();

        Ok(UsageReport {
            wp_user_id,
            plan_id: subscription.as_ref().map(|s| s.0),
            monthly_credit_limit: subscription.as_ref().map_or(0, |s| s.1),
            active: subscription.as_ref().is_some_and(|s| s.2),
            credits_remaining: balance.as_ref().map_or(0, |b| b.0),
            cycle_start: balance.as_ref().and_then(|b| b.1),
            cycle_end: subscription.as_ref().map(|s| s.3),
            recent_usage,
        })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
