//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `COACH_ORCHESTRATOR` prefix and nested values use double underscores as separators.
//! Every section has defaults, so the service starts with an empty environment.
//!
//! # Example
//!
//! ```no_run
//! use coach_orchestrator::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod batch;
mod cache;
mod error;
mod history;
mod server;
mod webhooks;

pub use ai::{AiConfig, AiProvider};
pub use batch::BatchConfig;
pub use cache::{CacheBackend, CacheConfig};
pub use error::{ConfigError, ValidationError};
pub use history::HistoryConfig;
pub use server::{Environment, ServerConfig};
pub use webhooks::WebhooksConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// AI provider configuration (OpenAI/Anthropic)
    #[serde(default)]
    pub ai: AiConfig,

    /// Response cache configuration (memory/Redis)
    #[serde(default)]
    pub cache: CacheConfig,

    /// Batch orchestration limits
    #[serde(default)]
    pub batch: BatchConfig,

    /// Webhook secrets and maintenance cadence
    #[serde(default)]
    pub webhooks: WebhooksConfig,

    /// Interaction history limits
    #[serde(default)]
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `COACH_ORCHESTRATOR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `COACH_ORCHESTRATOR__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `COACH_ORCHESTRATOR__CACHE__TTL_SECS=600` -> `cache.ttl_secs = 600`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COACH_ORCHESTRATOR")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Production additionally requires at least one AI key and a webhook
    /// secret for every provider.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let production = self.is_production();
        self.server.validate()?;
        self.ai.validate(production)?;
        self.cache.validate()?;
        self.batch.validate()?;
        self.webhooks.validate(production)?;
        self.history.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
