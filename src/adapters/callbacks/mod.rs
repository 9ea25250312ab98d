//! Callback adapters - pending asynchronous completions and result forwarding.

mod http_notifier;
mod in_memory_registry;

pub use http_notifier::HttpCallbackNotifier;
pub use in_memory_registry::InMemoryCallbackRegistry;
