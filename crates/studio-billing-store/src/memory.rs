//! In-memory ledger implementation.
//!
//! Backs tests (and local development without PostgreSQL). A single mutex
//! over the whole state serializes operations, which gives the same per-user
//! linearizability the row-locked PostgreSQL transaction provides.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;

use studio_billing_core::{
    CreditBalance, DebitOutcome, Subscription, SubscriptionUpdate, UsageLogEntry, UsageReport,
    UserId, WpUserId,
};

use crate::error::{Result, StoreError};
use crate::Ledger;

#[derive(Debug, Default)]
struct MemUser {
    id: i64,
    email: Option<String>,
    subscription: Option<Subscription>,
    balance: Option<CreditBalance>,
    usage: Vec<UsageLogEntry>,
}

#[derive(Debug, Default)]
struct MemState {
    next_user_id: i64,
    users: HashMap<i64, MemUser>,
}

impl MemState {
    fn get_or_create(&mut self, wp_user_id: WpUserId, email: Option<&str>) -> &mut MemUser {
        let next_id = self.next_user_id + 1;
        let mut created = false;
        let user = self.users.entry(wp_user_id.get()).or_insert_with(|| {
            created = true;
            MemUser {
                id: next_id,
                ..MemUser::default()
            }
        });
        if created {
            self.next_user_id = next_id;
        }

        if let Some(email) = email {
            user.email = Some(email.to_string());
        }

        user
    }
}

/// In-memory ledger, keyed by external identity.
#[derive(Debug, Default)]
pub struct MemLedger {
    state: Mutex<MemState>,
}

impl MemLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl Ledger for MemLedger {
    async fn get_or_create_user(
        &self,
        wp_user_id: WpUserId,
        email: Option<&str>,
    ) -> Result<UserId> {
        let mut state = self.lock();
        let id = state.get_or_create(wp_user_id, email).id;
        Ok(UserId::new(id))
    }

    async fn find_user(&self, wp_user_id: WpUserId) -> Result<Option<UserId>> {
        let state = self.lock();
        Ok(state
            .users
            .get(&wp_user_id.get())
            .map(|u| UserId::new(u.id)))
    }

    async fn upsert_subscription(&self, update: &SubscriptionUpdate) -> Result<UserId> {
        let mut state = self.lock();
        let user = state.get_or_create(update.wp_user_id, update.email.as_deref());

        user.subscription = Some(Subscription {
            plan_id: update.plan_id,
            monthly_credit_limit: update.monthly_credit_limit,
            cycle_start: update.cycle_start,
            cycle_end: update.cycle_end,
            active: update.active,
        });
        user.balance = Some(CreditBalance {
            credits_remaining: update.monthly_credit_limit,
            cycle_start: Some(update.cycle_start),
            updated_at: Utc::now(),
        });

        Ok(UserId::new(user.id))
    }

    async fn debit(
        &self,
        wp_user_id: WpUserId,
        feature_type: &str,
        cost: i64,
        metadata: serde_json::Value,
    ) -> Result<DebitOutcome> {
        let mut state = self.lock();

        let user = state
            .users
            .get_mut(&wp_user_id.get())
            .ok_or(StoreError::UserNotFound { wp_user_id })?;

        if !user.subscription.as_ref().is_some_and(|s| s.active) {
            return Err(StoreError::SubscriptionInactive { wp_user_id });
        }

        let balance = user
            .balance
            .as_mut()
            .ok_or(StoreError::BalanceNotFound { wp_user_id })?;

        if balance.credits_remaining < cost {
            return Err(StoreError::InsufficientCredits {
                remaining: balance.credits_remaining,
                required: cost,
            });
        }

        balance.credits_remaining -= cost;
        balance.updated_at = Utc::now();
        let credits_remaining = balance.credits_remaining;

        user.usage.push(UsageLogEntry {
            feature_type: feature_type.to_string(),
            credits_spent: cost,
            metadata,
            created_at: Utc::now(),
        });

        Ok(DebitOutcome {
            credits_remaining,
            charged: cost,
        })
    }

    async fn usage_report(&self, wp_user_id: WpUserId, recent_limit: i64) -> Result<UsageReport> {
        let state = self.lock();

        let user = state
            .users
            .get(&wp_user_id.get())
            .ok_or(StoreError::UserNotFound { wp_user_id })?;

        let recent_usage = user
            .usage
            .iter()
            .rev()
            .take(usize::try_from(recent_limit).unwrap_or(0))
            .cloned()
            .collect();

        Ok(UsageReport {
            wp_user_id,
            plan_id: user.subscription.as_ref().map(|s| s.plan_id),
            monthly_credit_limit: user
                .subscription
                .as_ref()
                .map_or(0, |s| s.monthly_credit_limit),
            active: user.subscription.as_ref().is_some_and(|s| s.active),
            credits_remaining: user.balance.as_ref().map_or(0, |b| b.credits_remaining),
            cycle_start: user.balance.as_ref().and_then(|b| b.cycle_start),
            cycle_end: user.subscription.as_ref().map(|s| s.cycle_end),
            recent_usage,
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
