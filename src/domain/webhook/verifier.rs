//! HMAC-SHA256 webhook signature verification.
//!
//! Signatures are the lowercase hex HMAC-SHA256 of the raw request body,
//! optionally prefixed with `sha256=`. Comparison is constant-time and
//! happens before the body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::WebhookError;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verifier bound to one shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into().into_bytes(),
        }
    }

    /// Checks `signature` against the body.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` - header absent or blank
    /// - `InvalidSignature` - not hex, or does not match
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::MissingSignature)?;
        let signature = signature.strip_prefix(SIGNATURE_PREFIX).unwrap_or(signature);

        let provided = hex::decode(signature).map_err(|_| WebhookError::InvalidSignature)?;
        let expected = self.compute(payload)?;

        if expected.len() != provided.len() || expected.as_slice().ct_eq(provided.as_slice()).unwrap_u8() != 1 {
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    /// Hex signature for `payload`, as a sender would put in the header.
    pub fn sign(&self, payload: &[u8]) -> Result<String, WebhookError> {
        Ok(hex::encode(self.compute(payload)?))
    }

    fn compute(&self, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
