//! Application state.

use std::sync::Arc;

use studio_billing_store::Ledger;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::novita::NovitaClient;

/// Application state shared across handlers.
///
/// The ledger handle is injected here rather than read from a global so
/// tests can substitute an in-memory instance per test run.
#[derive(Clone)]
pub struct AppState {
    /// The credit ledger.
    pub ledger: Arc<dyn Ledger>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Novita client for generation proxying (optional).
    pub novita: Option<Arc<NovitaClient>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(ledger: Arc<dyn Ledger>, config: ServiceConfig) -> Self {
        let novita = config.novita_api_key.as_ref().and_then(|key| {
            match NovitaClient::new(&config.novita_base_url, key) {
                Ok(client) => {
                    tracing::info!(base_url = %config.novita_base_url, "Novita integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Novita client");
                    None
                }
            }
        });

        if novita.is_none() {
            tracing::warn!("Novita not configured - generation endpoints will refuse requests");
        }

        Self {
            ledger,
            config,
            novita,
        }
    }

    /// The Novita client, or a 500 if the key is not configured.
    pub fn novita(&self) -> Result<&NovitaClient, ApiError> {
        self.novita
            .as_deref()
            .ok_or_else(|| ApiError::Internal("NOVITA_API_KEY is not configured".into()))
    }
}
