//! Typed inputs, output schemas and fallback outputs for every agent operation.

mod assessment;
mod communication;
mod daily_insight;
mod learning_path;
mod progress;
pub mod schema;

pub use assessment::{
    fallback_assessment, AssessmentAnalysis, AssessmentAnswer, AssessmentInput, HealthCategory,
    Insight, Recommendation, MAX_ANSWERS,
};
pub use communication::{
    fallback_communication, fallback_conflict, CommunicationCoaching, CommunicationInput,
    ConflictInput, ConflictResolution, ConflictSeverity, ResolutionStrategy, Suggestion, Tone,
};
pub use daily_insight::{fallback_daily_insight, DailyInsight, DailyInsightInput, InsightCategory};
pub use learning_path::{
    fallback_learning_path, LearningModule, LearningPath, LearningPathInput, SkillLevel,
};
pub use progress::{
    fallback_progress, CompletedActivity, ProgressAnalysis, ProgressInput, ProgressTrend,
};
pub use schema::{parse_output, AgentInput, OutputSchema, SchemaError};
