//! Service configuration.

use studio_billing_core::PricingConfig;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum connections in the store pool.
    pub db_max_connections: u32,

    /// How long an operation waits for a free pool connection, in seconds.
    pub db_acquire_timeout_seconds: u64,

    /// Server-side statement timeout, in seconds. A hung query aborts and
    /// its transaction rolls back instead of holding row locks.
    pub db_statement_timeout_seconds: u64,

    /// Interval between liveness pings against the store, in seconds.
    /// `0` disables the probe.
    pub db_keepalive_seconds: u64,

    /// Novita API key. Generation endpoints refuse requests without it.
    pub novita_api_key: Option<String>,

    /// Novita API base URL.
    pub novita_base_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes. Generous by default because
    /// image-to-video and face-merge requests carry base64 images.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// How many usage-log entries the usage report returns.
    pub recent_usage_limit: i64,

    /// Pricing configuration.
    pub pricing: PricingConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: env_parsed("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            db_acquire_timeout_seconds: env_parsed(
                "DB_ACQUIRE_TIMEOUT_SECONDS",
                defaults.db_acquire_timeout_seconds,
            ),
            db_statement_timeout_seconds: env_parsed(
                "DB_STATEMENT_TIMEOUT_SECONDS",
                defaults.db_statement_timeout_seconds,
            ),
            db_keepalive_seconds: env_parsed("DB_KEEPALIVE_SECONDS", defaults.db_keepalive_seconds),
            novita_api_key: std::env::var("NOVITA_API_KEY").ok(),
            novita_base_url: std::env::var("NOVITA_BASE_URL").unwrap_or(defaults.novita_base_url),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parsed("MAX_BODY_BYTES", defaults.max_body_bytes),
            request_timeout_seconds: env_parsed(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            ),
            recent_usage_limit: env_parsed("RECENT_USAGE_LIMIT", defaults.recent_usage_limit),
            pricing: PricingConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: "postgres://localhost/studio_billing".into(),
            db_max_connections: 10,
            db_acquire_timeout_seconds: 10,
            db_statement_timeout_seconds: 10,
            db_keepalive_seconds: 240,
            novita_api_key: None,
            novita_base_url: "https://api.novita.ai".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 20 * 1024 * 1024, // 20MB, base64 images
            request_timeout_seconds: 90,
            recent_usage_limit: 10,
            pricing: PricingConfig::default(),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
