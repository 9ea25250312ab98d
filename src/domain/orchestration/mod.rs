//! Orchestration module - Request/response model shared by every component.
//!
//! - `AgentRequest` / `AgentResponse` - the immutable request and its raw result
//! - `Fingerprint` - normalized cache key
//! - `AIError` / `OrchestratorError` - failure vocabulary
//! - `classify` - the error classifier

mod agent_type;
mod classifier;
mod errors;
mod fingerprint;
mod prompt;
mod provider_error;
mod request;
mod response;

pub use agent_type::{AgentOperation, AgentType, Priority};
pub use classifier::{classify, Classification, ErrorContext, RecoveryAction};
pub use errors::OrchestratorError;
pub use fingerprint::{canonical_json, normalize, Fingerprint, TRANSIENT_KEYS};
pub use prompt::Prompt;
pub use provider_error::AIError;
pub use request::AgentRequest;
pub use response::{AgentResponse, OutcomeSource, TokenUsage};
