use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Source of an inbound webhook. Each has its own secret, header and schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookProvider {
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
    Custom,
}

impl WebhookProvider {
    pub fn all() -> &'static [WebhookProvider] {
        &[
            WebhookProvider::OpenAI,
            WebhookProvider::Anthropic,
            WebhookProvider::Custom,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookProvider::OpenAI => "openai",
            WebhookProvider::Anthropic => "anthropic",
            WebhookProvider::Custom => "custom",
        }
    }

    /// Header carrying the hex HMAC-SHA256 of the raw body.
    pub fn signature_header(&self) -> &'static str {
        match self {
            WebhookProvider::OpenAI => "x-openai-signature",
            WebhookProvider::Anthropic => "x-anthropic-signature",
            WebhookProvider::Custom => "x-webhook-signature",
        }
    }
}

impl fmt::Display for WebhookProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookProvider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WebhookProvider::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("provider", format!("unknown provider '{}'", s))
            })
    }
}
