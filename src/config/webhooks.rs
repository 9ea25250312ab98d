//! Webhook configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::webhook::WebhookProvider;

/// Webhook configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebhooksConfig {
    /// Shared secret for OpenAI webhooks
    pub openai_secret: Option<SecretString>,

    /// Shared secret for Anthropic webhooks
    pub anthropic_secret: Option<SecretString>,

    /// Shared secret for custom deliveries and forwarded callbacks
    pub custom_secret: Option<SecretString>,

    /// Interval of the maintenance sweep in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// How long processed event ids are remembered
    #[serde(default = "default_retention")]
    pub retention_hours: u64,

    /// Timeout for forwarding a settled result to a callback URL
    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_secs: u64,
}

impl WebhooksConfig {
    /// Secret for a provider, if configured and non-empty.
    pub fn secret(&self, provider: WebhookProvider) -> Option<&str> {
        let secret = match provider {
            WebhookProvider::OpenAI => self.openai_secret.as_ref(),
            WebhookProvider::Anthropic => self.anthropic_secret.as_ref(),
            WebhookProvider::Custom => self.custom_secret.as_ref(),
        };
        secret.map(|s| s.expose_secret().as_str()).filter(|s| !s.is_empty())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 3600)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    /// Validate webhook configuration
    pub fn validate(&self, require_secrets: bool) -> Result<(), ValidationError> {
        ValidationError::check_range("webhooks.sweep_interval_secs", self.sweep_interval_secs, 1, 3600)?;
        ValidationError::check_range("webhooks.notify_timeout_secs", self.notify_timeout_secs, 1, 120)?;

        if require_secrets {
            for provider in WebhookProvider::all() {
                if self.secret(*provider).is_none() {
                    return Err(ValidationError::MissingRequired(match provider {
                        WebhookProvider::OpenAI => "WEBHOOKS__OPENAI_SECRET",
                        WebhookProvider::Anthropic => "WEBHOOKS__ANTHROPIC_SECRET",
                        WebhookProvider::Custom => "WEBHOOKS__CUSTOM_SECRET",
                    }));
                }
            }
        }
        Ok(())
    }
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            openai_secret: None,
            anthropic_secret: None,
            custom_secret: None,
            sweep_interval_secs: default_sweep_interval(),
            retention_hours: default_retention(),
            notify_timeout_secs: default_notify_timeout(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_retention() -> u64 {
    7 * 24
}

fn default_notify_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhooks_config_defaults() {
        let config = WebhooksConfig::default();
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert!(config.secret(WebhookProvider::OpenAI).is_none());
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn test_secrets_required_when_asked() {
        let config = WebhooksConfig {
            openai_secret: Some(SecretString::new("whsec_a".to_string())),
            anthropic_secret: Some(SecretString::new("whsec_b".to_string())),
            ..Default::default()
        };
        assert_eq!(
            config.validate(true),
            Err(ValidationError::MissingRequired("WEBHOOKS__CUSTOM_SECRET"))
        );
    }

    #[test]
    fn test_empty_secret_counts_as_missing() {
        let config = WebhooksConfig {
            custom_secret: Some(SecretString::new(String::new())),
            ..Default::default()
        };
        assert!(config.secret(WebhookProvider::Custom).is_none());
    }
}
