//! Common test utilities for studio-billing integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;

use studio_billing_service::{create_router, AppState, ServiceConfig};
use studio_billing_store::MemLedger;

/// Test harness running the service router over an in-memory ledger.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
}

impl TestHarness {
    /// Harness without a provider configured (ledger endpoints only).
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Harness with the provider pointed at a mock server.
    pub fn with_novita(base_url: &str) -> Self {
        Self::with_config(ServiceConfig {
            novita_api_key: Some("test-novita-key".into()),
            novita_base_url: base_url.into(),
            ..test_config()
        })
    }

    fn with_config(config: ServiceConfig) -> Self {
        let ledger = Arc::new(MemLedger::new());
        let state = AppState::new(ledger, config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        Self { server }
    }

    /// Ingest a subscription, asserting success.
    pub async fn ingest(&self, wp_user_id: i64, monthly_credit_limit: i64, active: bool) {
        self.server
            .post("/webhook/subscription-update")
            .json(&json!({
                "wp_user_id": wp_user_id,
                "plan_id": 2,
                "monthly_credit_limit": monthly_credit_limit,
                "cycle_start": "2025-01-01",
                "cycle_end": "2025-01-31",
                "active": active,
            }))
            .await
            .assert_status_ok();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        novita_api_key: None,
        ..ServiceConfig::default()
    }
}
