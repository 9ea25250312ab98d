//! AssessmentAnalysisHandler - Scores a completed relationship assessment.

use serde_json::Value;
use std::sync::Arc;

use crate::domain::agents::{fallback_assessment, AssessmentAnalysis, AssessmentInput};
use crate::domain::orchestration::{AgentOperation, OrchestratorError, Prompt};
use crate::ports::Interaction;

use super::pipeline::{AgentCommand, AgentOutcome, AgentPipeline, OperationDefinition};
use super::prompts::compose;

const ROLE: &str = "You are a relationship coach analysing a completed relationship \
assessment. Be warm, specific and grounded in the answers given.";

const OUTPUT_SHAPE: &str = r#"{
  "score": number 0-100,
  "category": "needs_attention" | "developing" | "healthy" | "thriving",
  "summary": string,
  "strengths": [string],
  "growth_areas": [string],
  "insights": [{"title": string, "description": string, "confidence": number 0-1}],
  "recommendations": [{"title": string, "description": string, "priority": "low" | "medium" | "high"}]
}"#;

pub(super) const DEFINITION: OperationDefinition<AssessmentInput, AssessmentAnalysis> = OperationDefinition {
    operation: AgentOperation::AnalyzeAssessment,
    build_prompt,
    fallback: fallback_assessment,
    summarize,
};

fn build_prompt(input: &AssessmentInput, context: Option<&Value>, history: &[Interaction]) -> Prompt {
    let task = format!(
        "Analyse this {} assessment. Give an overall score, at least one insight and at \
         least one recommendation.",
        input.assessment_type.trim()
    );
    compose(ROLE, OUTPUT_SHAPE, &task, input, context, history)
}

fn summarize(output: &AssessmentAnalysis) -> String {
    format!("Assessment scored {:.0}: {}", output.score, output.summary)
}

/// Handler for `analyze_assessment`.
pub struct AssessmentAnalysisHandler {
    pipeline: Arc<AgentPipeline>,
}

impl AssessmentAnalysisHandler {
    pub fn new(pipeline: Arc<AgentPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn handle(
        &self,
        cmd: AgentCommand<AssessmentInput>,
    ) -> Result<AgentOutcome<AssessmentAnalysis>, OrchestratorError> {
        self.pipeline.run(&DEFINITION, cmd).await
    }
}
