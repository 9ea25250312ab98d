//! Agent capabilities, their operations and request priority.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// One of the five specialized agent capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    AssessmentAnalysis,
    LearningPath,
    ProgressAnalysis,
    DailyInsight,
    CommunicationCoaching,
}

impl AgentType {
    /// All agent types in declaration order.
    pub fn all() -> &'static [AgentType] {
        &[
            AgentType::AssessmentAnalysis,
            AgentType::LearningPath,
            AgentType::ProgressAnalysis,
            AgentType::DailyInsight,
            AgentType::CommunicationCoaching,
        ]
    }

    /// Stable snake_case tag, also used inside fingerprints.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::AssessmentAnalysis => "assessment_analysis",
            AgentType::LearningPath => "learning_path",
            AgentType::ProgressAnalysis => "progress_analysis",
            AgentType::DailyInsight => "daily_insight",
            AgentType::CommunicationCoaching => "communication_coaching",
        }
    }

    /// Operation used when a caller names only the agent type.
    pub fn default_operation(&self) -> AgentOperation {
        match self {
            AgentType::AssessmentAnalysis => AgentOperation::AnalyzeAssessment,
            AgentType::LearningPath => AgentOperation::GenerateLearningPath,
            AgentType::ProgressAnalysis => AgentOperation::AnalyzeProgress,
            AgentType::DailyInsight => AgentOperation::GenerateDailyInsight,
            AgentType::CommunicationCoaching => AgentOperation::CoachCommunication,
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentType::all()
            .iter()
            .find(|t| t.as_str() == s.trim())
            .copied()
            .ok_or_else(|| {
                ValidationError::invalid_format("agent_type", format!("unknown agent type '{}'", s))
            })
    }
}

/// Concrete entry point of an agent. Each operation belongs to exactly one agent type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentOperation {
    AnalyzeAssessment,
    GenerateLearningPath,
    AnalyzeProgress,
    GenerateDailyInsight,
    CoachCommunication,
    ResolveConflict,
}

impl AgentOperation {
    /// All operations in declaration order.
    pub fn all() -> &'static [AgentOperation] {
        &[
            AgentOperation::AnalyzeAssessment,
            AgentOperation::GenerateLearningPath,
            AgentOperation::AnalyzeProgress,
            AgentOperation::GenerateDailyInsight,
            AgentOperation::CoachCommunication,
            AgentOperation::ResolveConflict,
        ]
    }

    pub fn agent_type(&self) -> AgentType {
        match self {
            AgentOperation::AnalyzeAssessment => AgentType::AssessmentAnalysis,
            AgentOperation::GenerateLearningPath => AgentType::LearningPath,
            AgentOperation::AnalyzeProgress => AgentType::ProgressAnalysis,
            AgentOperation::GenerateDailyInsight => AgentType::DailyInsight,
            AgentOperation::CoachCommunication | AgentOperation::ResolveConflict => {
                AgentType::CommunicationCoaching
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentOperation::AnalyzeAssessment => "analyze_assessment",
            AgentOperation::GenerateLearningPath => "generate_learning_path",
            AgentOperation::AnalyzeProgress => "analyze_progress",
            AgentOperation::GenerateDailyInsight => "generate_daily_insight",
            AgentOperation::CoachCommunication => "coach_communication",
            AgentOperation::ResolveConflict => "resolve_conflict",
        }
    }
}

impl fmt::Display for AgentOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentOperation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentOperation::all()
            .iter()
            .find(|op| op.as_str() == s.trim())
            .copied()
            .ok_or_else(|| {
                ValidationError::invalid_format("operation", format!("unknown operation '{}'", s))
            })
    }
}

/// Request priority. High priority requests may use a dedicated provider route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_maps_to_one_agent_type() {
        for op in AgentOperation::all() {
            let agent_type = op.agent_type();
            assert!(AgentType::all().contains(&agent_type));
        }
        assert_eq!(
            AgentOperation::ResolveConflict.agent_type(),
            AgentType::CommunicationCoaching
        );
    }

    #[test]
    fn default_operation_belongs_to_agent_type() {
        for agent_type in AgentType::all() {
            assert_eq!(agent_type.default_operation().agent_type(), *agent_type);
        }
    }

    #[test]
    fn parse_round_trips_tags() {
        for op in AgentOperation::all() {
            assert_eq!(op.as_str().parse::<AgentOperation>().unwrap(), *op);
        }
        for t in AgentType::all() {
            assert_eq!(t.as_str().parse::<AgentType>().unwrap(), *t);
        }
    }

    #[test]
    fn unknown_agent_type_is_validation_error() {
        let err = "horoscope".parse::<AgentType>().unwrap_err();
        assert_eq!(err.field(), "agent_type");
    }

    #[test]
    fn serde_tags_match_as_str() {
        let json = serde_json::to_string(&AgentOperation::GenerateDailyInsight).unwrap();
        assert_eq!(json, "\"generate_daily_insight\"");
        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, "\"high\"");
    }
}
