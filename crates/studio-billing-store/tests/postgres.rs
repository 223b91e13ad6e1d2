//! PostgreSQL ledger integration tests.
//!
//! These need a live PostgreSQL. Point `DATABASE_URL` at a scratch database
//! and run:
//!
//! ```text
//! cargo test --package studio-billing-store -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use serde_json::json;

use studio_billing_core::{SubscriptionUpdate, WpUserId};
use studio_billing_store::{Ledger, PgLedger, StoreError};

async fn connect() -> PgLedger {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let ledger = PgLedger::connect(&url, 8, Duration::from_secs(5), Duration::from_secs(5))
        .await
        .expect("failed to connect");
    ledger.migrate().await.expect("failed to migrate");
    ledger
}

/// A wp_user_id unlikely to collide across test runs.
fn fresh_wp_user_id() -> WpUserId {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    WpUserId::new(1_000_000 + i64::from(nanos))
}

fn ingest(wp_user_id: WpUserId, monthly_credit_limit: i64, active: bool) -> SubscriptionUpdate {
    SubscriptionUpdate {
        wp_user_id,
        email: Some(format!("{wp_user_id}@test.example.com")),
        plan_id: 2,
        monthly_credit_limit,
        cycle_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        cycle_end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        active,
    }
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL (set DATABASE_URL)"]
async fn debit_path_end_to_end() {
    let ledger = connect().await;
    let wp = fresh_wp_user_id();

    ledger.upsert_subscription(&ingest(wp, 1000, true)).await.unwrap();

    let out = ledger
        .debit(wp, "kling_v25_t2v", 320, json!({ "duration": 5 }))
        .await
        .unwrap();
    assert_eq!(out.credits_remaining, 680);
    assert_eq!(out.charged, 320);

    let report = ledger.usage_report(wp, 10).await.unwrap();
    assert_eq!(report.credits_remaining, 680);
    assert_eq!(report.recent_usage.len(), 1);
    assert_eq!(report.recent_usage[0].feature_type, "kling_v25_t2v");
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL (set DATABASE_URL)"]
async fn insufficient_debit_rolls_back_whole() {
    let ledger = connect().await;
    let wp = fresh_wp_user_id();

    ledger.upsert_subscription(&ingest(wp, 100, true)).await.unwrap();

    let err = ledger
        .debit(wp, "merge_face", 240, json!({}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientCredits {
            remaining: 100,
            required: 240
        }
    ));

    let report = ledger.usage_report(wp, 10).await.unwrap();
    assert_eq!(report.credits_remaining, 100);
    assert!(report.recent_usage.is_empty());
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL (set DATABASE_URL)"]
async fn reingestion_is_idempotent_and_resets() {
    let ledger = connect().await;
    let wp = fresh_wp_user_id();

    let update = ingest(wp, 1000, true);
    let first = ledger.upsert_subscription(&update).await.unwrap();
    ledger.debit(wp, "seedream_30_t2i", 120, json!({})).await.unwrap();
    let second = ledger.upsert_subscription(&update).await.unwrap();

    assert_eq!(first, second);
    let report = ledger.usage_report(wp, 10).await.unwrap();
    assert_eq!(report.credits_remaining, 1000);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a live PostgreSQL (set DATABASE_URL)"]
async fn row_lock_serializes_concurrent_debits() {
    let ledger = Arc::new(connect().await);
    let wp = fresh_wp_user_id();

    ledger.upsert_subscription(&ingest(wp, 1000, true)).await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.debit(wp, "kling_v25_i2v_imagine", 250, json!({})).await })
        })
        .collect();

    let results = futures::future::join_all(tasks).await;
    let succeeded = results
        .iter()
        .filter(|r| r.as_ref().unwrap().is_ok())
        .count();

    assert_eq!(succeeded, 4);

    let report = ledger.usage_report(wp, 20).await.unwrap();
    assert_eq!(report.credits_remaining, 0);
    let spent: i64 = report.recent_usage.iter().map(|u| u.credits_spent).sum();
    assert_eq!(spent, 1000);
}
