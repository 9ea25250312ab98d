//! LearningPathHandler - Builds a week-by-week learning program.

use serde_json::Value;
use std::sync::Arc;

use crate::domain::agents::{fallback_learning_path, LearningPath, LearningPathInput};
use crate::domain::orchestration::{AgentOperation, OrchestratorError, Prompt};
use crate::ports::Interaction;

use super::pipeline::{AgentCommand, AgentOutcome, AgentPipeline, OperationDefinition};
use super::prompts::compose;

const ROLE: &str = "You are a relationship coach designing a practical learning program \
for a couple. Activities must be concrete and achievable in the time available.";

const OUTPUT_SHAPE: &str = r#"{
  "title": string,
  "description": string,
  "duration_weeks": integer 1-52,
  "difficulty": "beginner" | "intermediate" | "advanced",
  "modules": [{"title": string, "description": string, "week": integer, "estimated_minutes": integer 5-240, "activities": [string]}],
  "expected_outcomes": [string],
  "completion_probability": number 0-1
}"#;

pub(super) const DEFINITION: OperationDefinition<LearningPathInput, LearningPath> = OperationDefinition {
    operation: AgentOperation::GenerateLearningPath,
    build_prompt,
    fallback: fallback_learning_path,
    summarize,
};

fn build_prompt(input: &LearningPathInput, context: Option<&Value>, history: &[Interaction]) -> Prompt {
    let mut task = "Create a learning path that works toward the goals below.".to_string();
    if let Some(weeks) = input.duration_weeks {
        task.push_str(&format!(" The program should last {} weeks.", weeks));
    }
    if let Some(minutes) = input.minutes_per_day {
        task.push_str(&format!(" The couple has about {} minutes per day.", minutes));
    }
    compose(ROLE, OUTPUT_SHAPE, &task, input, context, history)
}

fn summarize(output: &LearningPath) -> String {
    format!("{} ({} weeks, {} modules)", output.title, output.duration_weeks, output.modules.len())
}

/// Handler for `generate_learning_path`.
pub struct LearningPathHandler {
    pipeline: Arc<AgentPipeline>,
}

impl LearningPathHandler {
    pub fn new(pipeline: Arc<AgentPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn handle(
        &self,
        cmd: AgentCommand<LearningPathInput>,
    ) -> Result<AgentOutcome<LearningPath>, OrchestratorError> {
        self.pipeline.run(&DEFINITION, cmd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::application::handlers::agents::test_support::{harness, user};
    use crate::domain::agents::{OutputSchema, SkillLevel};
    use crate::domain::orchestration::OutcomeSource;

    fn input() -> LearningPathInput {
        LearningPathInput {
            goals: vec!["Argue less about chores".to_string()],
            focus_areas: vec!["communication".to_string()],
            current_level: SkillLevel::Beginner,
            duration_weeks: Some(4),
            minutes_per_day: Some(15),
        }
    }

    #[tokio::test]
    async fn clamps_weeks_and_minutes() {
        let raw = r#"{
            "title": "Calmer chores",
            "description": "Four weeks of small habits.",
            "duration_weeks": 80,
            "difficulty": "beginner",
            "modules": [{"title": "Name the load", "description": "List tasks.", "week": 99, "estimated_minutes": 1, "activities": ["Make a list"]}],
            "expected_outcomes": ["Fewer arguments"],
            "completion_probability": 1.7
        }"#;
        let h = harness(MockAIProvider::new().with_response(raw));
        let handler = LearningPathHandler::new(h.pipeline.clone());

        let outcome = handler.handle(AgentCommand::new(user(), input())).await.unwrap();

        assert_eq!(outcome.source, OutcomeSource::Provider);
        assert_eq!(outcome.output.duration_weeks, 52);
        assert_eq!(outcome.output.modules[0].week, 52);
        assert_eq!(outcome.output.modules[0].estimated_minutes, 5);
        assert_eq!(outcome.output.completion_probability, 1.0);
    }

    #[tokio::test]
    async fn module_without_activities_falls_back() {
        let raw = r#"{
            "title": "Calmer chores",
            "description": "Four weeks.",
            "duration_weeks": 4,
            "difficulty": "beginner",
            "modules": [{"title": "Week one", "description": "Start.", "week": 1, "estimated_minutes": 15, "activities": []}],
            "expected_outcomes": [],
            "completion_probability": 0.6
        }"#;
        let h = harness(MockAIProvider::new().with_response(raw));
        let handler = LearningPathHandler::new(h.pipeline.clone());

        let outcome = handler.handle(AgentCommand::new(user(), input())).await.unwrap();

        assert!(outcome.is_fallback());
        assert!(outcome.output.violations().is_empty());
        assert!(!outcome.output.modules.is_empty());
    }

    #[test]
    fn prompt_mentions_time_budget() {
        let prompt = build_prompt(&input(), None, &[]);
        assert!(prompt.user.contains("4 weeks"));
        assert!(prompt.user.contains("15 minutes"));
    }
}
