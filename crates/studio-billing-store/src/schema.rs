//! Relational schema for the ledger.
//!
//! Four tables, exclusively mutated by this crate:
//!
//! - `users` — external identity mapping, unique on `wp_user_id`
//! - `subscriptions` — one authoritative row per user (unique on `user_id`)
//! - `credit_balances` — one row per user, `credits_remaining >= 0` enforced
//!   by a CHECK constraint as a second line of defense behind the debit
//!   transaction
//! - `usage_logs` — append-only, indexed `(user_id, id DESC)` for the
//!   newest-first report query
//!
//! The DDL lives in `migrations/` and is embedded at compile time.

/// Embedded migrations for the ledger schema.
///
/// Run via [`crate::PgLedger::migrate`] at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
