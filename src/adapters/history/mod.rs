//! Interaction history adapters.

mod in_memory;

pub use in_memory::{InMemoryInteractionHistory, DEFAULT_MAX_INTERACTIONS};
