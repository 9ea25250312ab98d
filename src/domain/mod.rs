//! Domain layer containing orchestration types and pure rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, state machine, errors)
//! - `orchestration` - Agent requests/responses, fingerprints, error classifier
//! - `agents` - Typed inputs, output schemas and fallbacks per operation
//! - `batch` - Batch jobs, members and options
//! - `webhook` - Provider webhook verification, schemas and records

pub mod agents;
pub mod batch;
pub mod foundation;
pub mod orchestration;
pub mod webhook;
