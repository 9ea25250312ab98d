//! Agent handlers - One typed entry point per agent operation.
//!
//! Every handler delegates to the shared [`AgentPipeline`] with its own
//! [`OperationDefinition`]. [`AgentDispatcher`] exposes them behind the
//! `AgentExecutor` port.

mod assessment;
mod communication;
mod daily_insight;
mod dispatcher;
mod learning_path;
mod pipeline;
mod progress;
mod prompts;

#[cfg(test)]
pub(crate) mod test_support;

pub use assessment::AssessmentAnalysisHandler;
pub use communication::CommunicationCoachingHandler;
pub use daily_insight::DailyInsightHandler;
pub use dispatcher::AgentDispatcher;
pub use learning_path::LearningPathHandler;
pub use pipeline::{
    AgentCommand, AgentOutcome, AgentPipeline, OperationDefinition, DEFAULT_HISTORY_LIMIT,
    DEFAULT_MAX_ATTEMPTS,
};
pub use progress::ProgressAnalysisHandler;
