//! Communication coaching: message rewriting and conflict resolution.
//!
//! Both operations belong to the communication-coaching agent and share the
//! tone vocabulary, but have distinct inputs and output schemas.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;
use crate::domain::orchestration::Priority;

use super::schema::{clamp_score, clamp_unit, require_input_text, AgentInput, OutputSchema, Violations};

const MAX_MESSAGE_CHARS: usize = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Supportive,
    Neutral,
    Defensive,
    Critical,
    Dismissive,
    Hostile,
}

// ════════════════════════════════════════════════════════════════════════════════
// Message coaching
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationInput {
    /// The message the user wants to send, or a description of what they want to say.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_tone: Option<Tone>,
}

impl AgentInput for CommunicationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_input_text("message", &self.message)?;
        let chars = self.message.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(ValidationError::too_many("message", MAX_MESSAGE_CHARS, chars));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    pub improved: String,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationCoaching {
    pub assessment: String,
    pub detected_tone: Tone,
    /// How well the message is likely to land, in [0, 100].
    pub effectiveness_score: f64,
    pub suggestions: Vec<Suggestion>,
    pub techniques: Vec<String>,
    #[serde(default)]
    pub example_phrases: Vec<String>,
}

impl OutputSchema for CommunicationCoaching {
    fn normalized(mut self) -> Self {
        self.effectiveness_score = clamp_score(self.effectiveness_score);
        self
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Violations::new();
        v.require_text("assessment", &self.assessment)
            .require_items("suggestions", &self.suggestions)
            .require_items("techniques", &self.techniques)
            .require_each_text("techniques", &self.techniques)
            .require_each_text("example_phrases", &self.example_phrases);
        for (i, s) in self.suggestions.iter().enumerate() {
            v.require_text(&format!("suggestions[{}].improved", i), &s.improved)
                .require_text(&format!("suggestions[{}].rationale", i), &s.rationale);
        }
        v.into_vec()
    }
}

pub fn fallback_communication(input: &CommunicationInput) -> CommunicationCoaching {
    CommunicationCoaching {
        assessment: "We could not review this message in detail right now. The suggestions \
                     below work well for most conversations."
            .to_string(),
        detected_tone: Tone::Neutral,
        effectiveness_score: 50.0,
        suggestions: vec![Suggestion {
            original: Some(input.message.trim().to_string()),
            improved: "Start with how you feel and what you need, then invite your partner's view."
                .to_string(),
            rationale: "Leading with feelings and needs keeps the focus off blame.".to_string(),
        }],
        techniques: vec![
            "I-statements".to_string(),
            "Reflective listening".to_string(),
        ],
        example_phrases: vec!["I feel ... when ..., and I would love it if ...".to_string()],
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Conflict resolution
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Low,
    #[default]
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictInput {
    pub description: String,
    #[serde(default)]
    pub severity: ConflictSeverity,
    #[serde(default)]
    pub previous_attempts: Vec<String>,
}

impl AgentInput for ConflictInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_input_text("description", &self.description)?;
        let chars = self.description.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(ValidationError::too_many("description", MAX_MESSAGE_CHARS, chars));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionStrategy {
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
    /// Estimated chance of success, in [0, 1].
    pub success_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub summary: String,
    pub root_causes: Vec<String>,
    pub strategies: Vec<ResolutionStrategy>,
    pub de_escalation_steps: Vec<String>,
    pub urgency: Priority,
    #[serde(default)]
    pub seek_professional_help: bool,
}

impl OutputSchema for ConflictResolution {
    fn normalized(mut self) -> Self {
        for strategy in &mut self.strategies {
            strategy.success_probability = clamp_unit(strategy.success_probability);
        }
        self
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Violations::new();
        v.require_text("summary", &self.summary)
            .require_items("root_causes", &self.root_causes)
            .require_each_text("root_causes", &self.root_causes)
            .require_items("strategies", &self.strategies)
            .require_items("de_escalation_steps", &self.de_escalation_steps)
            .require_each_text("de_escalation_steps", &self.de_escalation_steps);
        for (i, strategy) in self.strategies.iter().enumerate() {
            let mut nested = Violations::new();
            nested
                .require_text("name", &strategy.name)
                .require_text("description", &strategy.description)
                .require_items("steps", &strategy.steps)
                .require_each_text("steps", &strategy.steps);
            v.extend(&format!("strategies[{}]", i), nested.into_vec());
        }
        v.into_vec()
    }
}

/// Severity drives urgency; high-severity conflicts always recommend outside help.
pub fn fallback_conflict(input: &ConflictInput) -> ConflictResolution {
    let (urgency, seek_professional_help) = match input.severity {
        ConflictSeverity::Low => (Priority::Low, false),
        ConflictSeverity::Moderate => (Priority::Medium, false),
        ConflictSeverity::High => (Priority::High, true),
    };

    ConflictResolution {
        summary: "Conflicts often come from unmet needs on both sides. Slowing the \
                  conversation down is the first step."
            .to_string(),
        root_causes: vec!["Needs that have not been clearly expressed".to_string()],
        strategies: vec![ResolutionStrategy {
            name: "Take a structured pause".to_string(),
            description: "Agree to pause and return to the topic once both of you feel calm."
                .to_string(),
            steps: vec![
                "Name that you need a break, without blame".to_string(),
                "Agree on a time to come back to the conversation".to_string(),
                "Each share one need before proposing solutions".to_string(),
            ],
            success_probability: 0.6,
        }],
        de_escalation_steps: vec![
            "Lower your voice and slow your breathing".to_string(),
            "Reflect back what you heard before responding".to_string(),
        ],
        urgency,
        seek_professional_help,
    }
}
