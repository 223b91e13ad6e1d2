//! Studio-Billing HTTP API Service.
//!
//! This crate provides the HTTP API for the studio-billing service:
//!
//! - Credit consumption (the debit transaction)
//! - Subscription ingestion from the billing system
//! - Usage reporting
//! - Generation gateway routes proxying the Novita provider API
//!
//! The ledger endpoints are driven by the WordPress frontend and the billing
//! system; the generation endpoints forward validated payloads to the
//! provider and optionally debit the caller's balance after a successful
//! dispatch.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers must be async for axum routing

pub mod config;
pub mod error;
pub mod handlers;
pub mod novita;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use novita::{NovitaClient, NovitaError};
pub use routes::create_router;
pub use state::AppState;
