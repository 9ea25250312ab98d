//! DailyInsightHandler - One short insight for the day.
//!
//! The date is part of the input, so every user asking about the same focus
//! area on the same day shares one cached insight.

use serde_json::Value;
use std::sync::Arc;

use crate::domain::agents::{fallback_daily_insight, DailyInsight, DailyInsightInput};
use crate::domain::orchestration::{AgentOperation, OrchestratorError, Prompt};
use crate::ports::Interaction;

use super::pipeline::{AgentCommand, AgentOutcome, AgentPipeline, OperationDefinition};
use super::prompts::compose;

const ROLE: &str = "You are a relationship coach writing a short daily insight. \
Keep the message under 80 words and the action item doable today.";

const OUTPUT_SHAPE: &str = r#"{
  "title": string,
  "message": string,
  "category": "communication" | "intimacy" | "trust" | "conflict" | "growth" | "appreciation",
  "action_item": string,
  "reflection_question": string,
  "relevance_score": number 0-1
}"#;

pub(super) const DEFINITION: OperationDefinition<DailyInsightInput, DailyInsight> = OperationDefinition {
    operation: AgentOperation::GenerateDailyInsight,
    build_prompt,
    fallback: fallback_daily_insight,
    summarize,
};

fn build_prompt(input: &DailyInsightInput, context: Option<&Value>, history: &[Interaction]) -> Prompt {
    let task = format!(
        "Write today's insight ({}) about {}. Avoid repeating recent insights.",
        input.date.trim(),
        input.focus_area.trim()
    );
    compose(ROLE, OUTPUT_SHAPE, &task, input, context, history)
}

fn summarize(output: &DailyInsight) -> String {
    output.title.clone()
}

/// Handler for `generate_daily_insight`.
pub struct DailyInsightHandler {
    pipeline: Arc<AgentPipeline>,
}

impl DailyInsightHandler {
    pub fn new(pipeline: Arc<AgentPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn handle(
        &self,
        cmd: AgentCommand<DailyInsightInput>,
    ) -> Result<AgentOutcome<DailyInsight>, OrchestratorError> {
        self.pipeline.run(&DEFINITION, cmd).await
    }
}
