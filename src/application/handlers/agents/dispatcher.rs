//! AgentDispatcher - Routes untyped invocations to the typed handlers.
//!
//! Used by the batch orchestrator and the HTTP agent endpoint. The input is
//! decoded into the operation's input type here, so a malformed member
//! surfaces as a validation error.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::batch::{AgentExecution, AgentInvocation};
use crate::domain::foundation::ValidationError;
use crate::domain::orchestration::{AgentOperation, OrchestratorError};
use crate::ports::AgentExecutor;

use super::{
    AgentCommand, AgentOutcome, AgentPipeline, AssessmentAnalysisHandler,
    CommunicationCoachingHandler, DailyInsightHandler, LearningPathHandler,
    ProgressAnalysisHandler,
};

pub struct AgentDispatcher {
    assessment: AssessmentAnalysisHandler,
    learning_path: LearningPathHandler,
    progress: ProgressAnalysisHandler,
    daily_insight: DailyInsightHandler,
    communication: CommunicationCoachingHandler,
}

impl AgentDispatcher {
    pub fn new(pipeline: Arc<AgentPipeline>) -> Self {
        Self {
            assessment: AssessmentAnalysisHandler::new(pipeline.clone()),
            learning_path: LearningPathHandler::new(pipeline.clone()),
            progress: ProgressAnalysisHandler::new(pipeline.clone()),
            daily_insight: DailyInsightHandler::new(pipeline.clone()),
            communication: CommunicationCoachingHandler::new(pipeline),
        }
    }
}

fn command<I: DeserializeOwned>(invocation: &AgentInvocation) -> Result<AgentCommand<I>, OrchestratorError> {
    let input: I = serde_json::from_value(invocation.input.clone())
        .map_err(|e| ValidationError::invalid_format("input", e.to_string()))?;

    let mut cmd = AgentCommand::new(invocation.user_id.clone(), input).with_priority(invocation.priority);
    if let Some(context) = invocation.context.clone() {
        cmd = cmd.with_context(context);
    }
    Ok(cmd)
}

fn execution<O: Serialize>(outcome: AgentOutcome<O>) -> Result<AgentExecution, OrchestratorError> {
    let output: Value = serde_json::to_value(&outcome.output)
        .map_err(|e| OrchestratorError::internal(format!("failed to encode output: {}", e)))?;
    Ok(AgentExecution {
        request_id: outcome.request_id,
        output,
        source: outcome.source,
        usage: outcome.usage,
    })
}

#[async_trait]
impl AgentExecutor for AgentDispatcher {
    async fn execute(&self, invocation: AgentInvocation) -> Result<AgentExecution, OrchestratorError> {
        match invocation.operation {
            AgentOperation::AnalyzeAssessment => {
                execution(self.assessment.handle(command(&invocation)?).await?)
            }
            AgentOperation::GenerateLearningPath => {
                execution(self.learning_path.handle(command(&invocation)?).await?)
            }
            AgentOperation::AnalyzeProgress => {
                execution(self.progress.handle(command(&invocation)?).await?)
            }
            AgentOperation::GenerateDailyInsight => {
                execution(self.daily_insight.handle(command(&invocation)?).await?)
            }
            AgentOperation::CoachCommunication => {
                execution(self.communication.coach(command(&invocation)?).await?)
            }
            AgentOperation::ResolveConflict => {
                execution(self.communication.resolve_conflict(command(&invocation)?).await?)
            }
        }
    }
}
