//! AI provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<SecretString>,

    /// Anthropic API key
    pub anthropic_api_key: Option<SecretString>,

    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Anthropic model name
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,

    /// Override for the OpenAI API base URL
    pub openai_base_url: Option<String>,

    /// Override for the Anthropic API base URL
    pub anthropic_base_url: Option<String>,

    /// Primary AI provider
    #[serde(default = "default_provider")]
    pub primary_provider: AiProvider,

    /// Fallback AI provider
    pub fallback_provider: Option<AiProvider>,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Submit OpenAI calls as background jobs completed via webhook
    #[serde(default)]
    pub openai_async_completion: bool,

    /// Submit Anthropic calls as background jobs completed via webhook
    #[serde(default)]
    pub anthropic_async_completion: bool,

    /// How long a pending callback waits for its webhook
    #[serde(default = "default_callback_expiration")]
    pub callback_expiration_minutes: u32,
}

/// AI provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAI,
    #[default]
    Anthropic,
}

impl AiProvider {
    /// Backend name used in router routes and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAI => "openai",
            AiProvider::Anthropic => "anthropic",
        }
    }
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get callback expiration as Duration
    pub fn callback_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.callback_expiration_minutes) * 60)
    }

    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Check if Anthropic is configured
    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Whether the given provider has a key
    pub fn has_provider(&self, provider: AiProvider) -> bool {
        match provider {
            AiProvider::OpenAI => self.has_openai(),
            AiProvider::Anthropic => self.has_anthropic(),
        }
    }

    /// Configured providers in routing order: primary, then fallback.
    pub fn route(&self) -> Vec<AiProvider> {
        let mut route = Vec::with_capacity(2);
        if self.has_provider(self.primary_provider) {
            route.push(self.primary_provider);
        }
        if let Some(fallback) = self.fallback_provider {
            if fallback != self.primary_provider && self.has_provider(fallback) {
                route.push(fallback);
            }
        }
        route
    }

    /// Validate AI configuration
    ///
    /// Keys are only required in production; elsewhere the service runs with
    /// fallback outputs only.
    pub fn validate(&self, require_keys: bool) -> Result<(), ValidationError> {
        ValidationError::check_range("ai.timeout_secs", self.timeout_secs, 1, 300)?;
        ValidationError::check_range(
            "ai.callback_expiration_minutes",
            u64::from(self.callback_expiration_minutes),
            1,
            24 * 60,
        )?;

        if self.fallback_provider == Some(self.primary_provider) {
            return Err(ValidationError::FallbackSameAsPrimary);
        }

        if !require_keys {
            return Ok(());
        }

        // At least one provider must have an API key
        if !self.has_openai() && !self.has_anthropic() {
            return Err(ValidationError::NoAiProviderConfigured);
        }

        // Primary provider must have an API key
        match self.primary_provider {
            AiProvider::OpenAI if !self.has_openai() => {
                return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
            }
            AiProvider::Anthropic if !self.has_anthropic() => {
                return Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"));
            }
            _ => {}
        }

        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            openai_base_url: None,
            anthropic_base_url: None,
            primary_provider: default_provider(),
            fallback_provider: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            openai_async_completion: false,
            anthropic_async_completion: false,
            callback_expiration_minutes: default_callback_expiration(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_provider() -> AiProvider {
    AiProvider::Anthropic
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    1
}

fn default_callback_expiration() -> u32 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: &str) -> Option<SecretString> {
        Some(SecretString::new(value.to_string()))
    }

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.primary_provider, AiProvider::Anthropic);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.callback_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_has_provider_checks() {
        let config = AiConfig {
            openai_api_key: key("sk-xxx"),
            anthropic_api_key: key(""),
            ..Default::default()
        };
        assert!(config.has_openai());
        assert!(!config.has_anthropic());
    }

    #[test]
    fn test_route_skips_unconfigured_providers() {
        let config = AiConfig {
            primary_provider: AiProvider::Anthropic,
            fallback_provider: Some(AiProvider::OpenAI),
            openai_api_key: key("sk-xxx"),
            ..Default::default()
        };
        assert_eq!(config.route(), vec![AiProvider::OpenAI]);

        let config = AiConfig {
            anthropic_api_key: key("sk-ant-xxx"),
            ..config
        };
        assert_eq!(config.route(), vec![AiProvider::Anthropic, AiProvider::OpenAI]);
    }

    #[test]
    fn test_keys_optional_outside_production() {
        assert!(AiConfig::default().validate(false).is_ok());
    }

    #[test]
    fn test_validation_no_provider() {
        assert_eq!(
            AiConfig::default().validate(true),
            Err(ValidationError::NoAiProviderConfigured)
        );
    }

    #[test]
    fn test_validation_primary_missing_key() {
        let config = AiConfig {
            primary_provider: AiProvider::Anthropic,
            openai_api_key: key("sk-xxx"),
            ..Default::default()
        };
        assert_eq!(
            config.validate(true),
            Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"))
        );
    }

    #[test]
    fn test_validation_fallback_same_as_primary() {
        let config = AiConfig {
            fallback_provider: Some(AiProvider::Anthropic),
            ..Default::default()
        };
        assert_eq!(config.validate(false), Err(ValidationError::FallbackSameAsPrimary));
    }

    #[test]
    fn test_validation_timeout_range() {
        let config = AiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate(false).is_err());
    }
}
