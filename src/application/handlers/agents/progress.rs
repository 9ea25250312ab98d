//! ProgressAnalysisHandler - Reviews recent activity against the user's goals.

use serde_json::Value;
use std::sync::Arc;

use crate::domain::agents::{fallback_progress, ProgressAnalysis, ProgressInput};
use crate::domain::orchestration::{AgentOperation, OrchestratorError, Prompt};
use crate::ports::Interaction;

use super::pipeline::{AgentCommand, AgentOutcome, AgentPipeline, OperationDefinition};
use super::prompts::compose;

const ROLE: &str = "You are a relationship coach reviewing a couple's recent practice. \
Celebrate real progress and suggest the next small step.";

const OUTPUT_SHAPE: &str = r#"{
  "overall_progress": number 0-100,
  "engagement_score": number 0-100,
  "trend": "improving" | "stable" | "declining",
  "summary": string,
  "milestones": [string],
  "areas_for_improvement": [string],
  "next_steps": [string],
  "goal_completion_probability": number 0-1
}"#;

pub(super) const DEFINITION: OperationDefinition<ProgressInput, ProgressAnalysis> = OperationDefinition {
    operation: AgentOperation::AnalyzeProgress,
    build_prompt,
    fallback: fallback_progress,
    summarize,
};

fn build_prompt(input: &ProgressInput, context: Option<&Value>, history: &[Interaction]) -> Prompt {
    let task = format!(
        "Analyse progress over the last {} days ({} completed activities).",
        input.period_days,
        input.completed_activities.len()
    );
    compose(ROLE, OUTPUT_SHAPE, &task, input, context, history)
}

fn summarize(output: &ProgressAnalysis) -> String {
    format!("Progress {:.0}/100: {}", output.overall_progress, output.summary)
}

/// Handler for `analyze_progress`.
pub struct ProgressAnalysisHandler {
    pipeline: Arc<AgentPipeline>,
}

impl ProgressAnalysisHandler {
    pub fn new(pipeline: Arc<AgentPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn handle(
        &self,
        cmd: AgentCommand<ProgressInput>,
    ) -> Result<AgentOutcome<ProgressAnalysis>, OrchestratorError> {
        self.pipeline.run(&DEFINITION, cmd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::application::handlers::agents::test_support::{harness, user};
    use crate::domain::agents::{CompletedActivity, ProgressTrend};
    use crate::domain::orchestration::{AIError, OutcomeSource};

    fn input() -> ProgressInput {
        ProgressInput {
            completed_activities: vec![CompletedActivity {
                activity_id: "a-1".to_string(),
                title: "Gratitude walk".to_string(),
                rating: Some(4.0),
            }],
            goals: vec!["Spend more quality time".to_string()],
            period_days: 14,
            previous_score: Some(40.0),
        }
    }

    #[tokio::test]
    async fn validated_output_is_returned() {
        let raw = r#"{
            "overall_progress": 55,
            "engagement_score": 120,
            "trend": "improving",
            "summary": "Steady effort.",
            "milestones": ["First walk"],
            "areas_for_improvement": [],
            "next_steps": ["Walk twice a week"],
            "goal_completion_probability": -0.2
        }"#;
        let h = harness(MockAIProvider::new().with_response(raw));
        let handler = ProgressAnalysisHandler::new(h.pipeline.clone());

        let outcome = handler.handle(AgentCommand::new(user(), input())).await.unwrap();

        assert_eq!(outcome.source, OutcomeSource::Provider);
        assert_eq!(outcome.output.trend, ProgressTrend::Improving);
        assert_eq!(outcome.output.engagement_score, 100.0);
        assert_eq!(outcome.output.goal_completion_probability, 0.0);
    }

    #[tokio::test]
    async fn non_retryable_provider_error_falls_back() {
        let h = harness(MockAIProvider::new().with_error(AIError::content_filtered("blocked")));
        let handler = ProgressAnalysisHandler::new(h.pipeline.clone());

        let outcome = handler.handle(AgentCommand::new(user(), input())).await.unwrap();

        assert!(outcome.is_fallback());
        assert!(!outcome.output.next_steps.is_empty());
        assert_eq!(h.provider.call_count(), 1);
    }

    #[tokio::test]
    async fn zero_day_period_is_rejected() {
        let h = harness(MockAIProvider::new());
        let handler = ProgressAnalysisHandler::new(h.pipeline.clone());
        let mut bad = input();
        bad.period_days = 0;

        let err = handler.handle(AgentCommand::new(user(), bad)).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Validation(_)));
    }
}
