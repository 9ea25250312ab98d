//! Webhook handlers - Inbound provider events and callback registration.

mod handle_provider_webhook;
mod register_callback;

pub use handle_provider_webhook::{
    DeliverCallbackCommand, HandleProviderWebhookCommand, HandleProviderWebhookHandler,
    HandleProviderWebhookResult,
};
pub use register_callback::{
    RegisterCallbackCommand, RegisterCallbackHandler, RegisterCallbackResult,
    DEFAULT_EXPIRATION_MINUTES,
};
