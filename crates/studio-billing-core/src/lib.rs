//! Core types and utilities for studio-billing.
//!
//! This crate provides the foundational types used throughout the
//! studio-billing platform:
//!
//! - **Identifiers**: [`WpUserId`], [`UserId`]
//! - **Entitlements**: [`Subscription`], [`CreditBalance`], [`SubscriptionUpdate`]
//! - **Usage**: [`UsageLogEntry`], [`UsageReport`], [`DebitOutcome`]
//! - **Pricing**: [`PricingConfig`], [`FeatureType`]
//! - **Coercion**: lenient deserializers for loosely-typed caller payloads
//!
//! # Credit Unit
//!
//! A credit is an abstract unit of prepaid entitlement. Each billed feature
//! carries an integer price in credits (e.g. a text-to-video job costs 320
//! credits). Balances are stored as `i64` and are never allowed to go
//! negative.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod coerce;
pub mod error;
pub mod feature;
pub mod ids;
pub mod pricing;
pub mod subscription;
pub mod usage;

pub use error::CostError;
pub use feature::FeatureType;
pub use ids::{IdError, UserId, WpUserId};
pub use pricing::{normalize_explicit_cost, PricingConfig, VideoTier};
pub use subscription::{CreditBalance, Subscription, SubscriptionUpdate};
pub use usage::{DebitOutcome, UsageLogEntry, UsageReport};
