//! CommunicationCoachingHandler - Message coaching and conflict resolution.
//!
//! One agent type with two operations; each has its own prompt, output
//! schema and fallback.

use serde_json::Value;
use std::sync::Arc;

use crate::domain::agents::{
    fallback_communication, fallback_conflict, CommunicationCoaching, CommunicationInput,
    ConflictInput, ConflictResolution,
};
use crate::domain::orchestration::{AgentOperation, OrchestratorError, Prompt};
use crate::ports::Interaction;

use super::pipeline::{AgentCommand, AgentOutcome, AgentPipeline, OperationDefinition};
use super::prompts::compose;

const COACHING_ROLE: &str = "You are a communication coach helping someone phrase a message \
to their partner. Preserve their intent and suggest kinder, clearer wording.";

const COACHING_SHAPE: &str = r#"{
  "assessment": string,
  "detected_tone": "supportive" | "neutral" | "defensive" | "critical" | "dismissive" | "hostile",
  "effectiveness_score": number 0-100,
  "suggestions": [{"original": string | null, "improved": string, "rationale": string}],
  "techniques": [string],
  "example_phrases": [string]
}"#;

const CONFLICT_ROLE: &str = "You are a relationship coach helping a couple work through a \
conflict. Recommend professional help when there are signs of abuse or crisis.";

const CONFLICT_SHAPE: &str = r#"{
  "summary": string,
  "root_causes": [string],
  "strategies": [{"name": string, "description": string, "steps": [string], "success_probability": number 0-1}],
  "de_escalation_steps": [string],
  "urgency": "low" | "medium" | "high",
  "seek_professional_help": boolean
}"#;

pub(super) const COACHING: OperationDefinition<CommunicationInput, CommunicationCoaching> =
    OperationDefinition {
        operation: AgentOperation::CoachCommunication,
        build_prompt: build_coaching_prompt,
        fallback: fallback_communication,
        summarize: summarize_coaching,
    };

pub(super) const CONFLICT: OperationDefinition<ConflictInput, ConflictResolution> = OperationDefinition {
    operation: AgentOperation::ResolveConflict,
    build_prompt: build_conflict_prompt,
    fallback: fallback_conflict,
    summarize: summarize_conflict,
};

fn build_coaching_prompt(
    input: &CommunicationInput,
    context: Option<&Value>,
    history: &[Interaction],
) -> Prompt {
    let task = match input.desired_tone {
        Some(tone) => format!(
            "Coach this message so it comes across as {}.",
            serde_json::to_value(tone)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "supportive".to_string())
        ),
        None => "Coach this message so it is heard, not just sent.".to_string(),
    };
    compose(COACHING_ROLE, COACHING_SHAPE, &task, input, context, history)
}

fn build_conflict_prompt(
    input: &ConflictInput,
    context: Option<&Value>,
    history: &[Interaction],
) -> Prompt {
    let task = if input.previous_attempts.is_empty() {
        "Help resolve this conflict.".to_string()
    } else {
        format!(
            "Help resolve this conflict. {} earlier attempts did not work; suggest something different.",
            input.previous_attempts.len()
        )
    };
    compose(CONFLICT_ROLE, CONFLICT_SHAPE, &task, input, context, history)
}

fn summarize_coaching(output: &CommunicationCoaching) -> String {
    format!("Message coaching: {}", output.assessment)
}

fn summarize_conflict(output: &ConflictResolution) -> String {
    format!("Conflict: {}", output.summary)
}

/// Handler for `coach_communication` and `resolve_conflict`.
pub struct CommunicationCoachingHandler {
    pipeline: Arc<AgentPipeline>,
}

impl CommunicationCoachingHandler {
    pub fn new(pipeline: Arc<AgentPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn coach(
        &self,
        cmd: AgentCommand<CommunicationInput>,
    ) -> Result<AgentOutcome<CommunicationCoaching>, OrchestratorError> {
        self.pipeline.run(&COACHING, cmd).await
    }

    pub async fn resolve_conflict(
        &self,
        cmd: AgentCommand<ConflictInput>,
    ) -> Result<AgentOutcome<ConflictResolution>, OrchestratorError> {
        self.pipeline.run(&CONFLICT, cmd).await
    }
}
