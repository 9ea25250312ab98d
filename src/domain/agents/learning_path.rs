//! Learning-path generation: a week-by-week program of coaching modules.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

use super::schema::{
    clamp_minutes, clamp_unit, clamp_weeks, require_input_items, require_input_text, AgentInput,
    OutputSchema, Violations,
};

const MAX_GOALS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPathInput {
    pub goals: Vec<String>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub current_level: SkillLevel,
    /// Desired program length; clamped into [1, 52].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_weeks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_per_day: Option<u32>,
}

impl AgentInput for LearningPathInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_input_items("goals", &self.goals, MAX_GOALS)?;
        for goal in &self.goals {
            require_input_text("goals", goal)?;
        }
        if self.duration_weeks == Some(0) {
            return Err(ValidationError::out_of_range("duration_weeks", 1.0, 52.0, 0.0));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningModule {
    pub title: String,
    pub description: String,
    /// Program week in [1, 52].
    pub week: u32,
    /// Estimated effort in [5, 240] minutes.
    pub estimated_minutes: u32,
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub title: String,
    pub description: String,
    /// Program length in [1, 52] weeks.
    pub duration_weeks: u32,
    pub difficulty: SkillLevel,
    pub modules: Vec<LearningModule>,
    #[serde(default)]
    pub expected_outcomes: Vec<String>,
    /// Likelihood of completing the program, in [0, 1].
    pub completion_probability: f64,
}

impl OutputSchema for LearningPath {
    fn normalized(mut self) -> Self {
        self.duration_weeks = clamp_weeks(self.duration_weeks);
        self.completion_probability = clamp_unit(self.completion_probability);
        for module in &mut self.modules {
            module.week = clamp_weeks(module.week).min(self.duration_weeks);
            module.estimated_minutes = clamp_minutes(module.estimated_minutes);
        }
        self
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Violations::new();
        v.require_text("title", &self.title)
            .require_text("description", &self.description)
            .require_items("modules", &self.modules)
            .require_each_text("expected_outcomes", &self.expected_outcomes);
        for (i, module) in self.modules.iter().enumerate() {
            let mut nested = Violations::new();
            nested
                .require_text("title", &module.title)
                .require_text("description", &module.description)
                .require_items("activities", &module.activities)
                .require_each_text("activities", &module.activities);
            v.extend(&format!("modules[{}]", i), nested.into_vec());
        }
        v.into_vec()
    }
}

/// Generic foundations program built from the caller's goals.
pub fn fallback_learning_path(input: &LearningPathInput) -> LearningPath {
    let duration_weeks = clamp_weeks(input.duration_weeks.unwrap_or(4));
    let minutes = clamp_minutes(input.minutes_per_day.unwrap_or(15));
    let primary_goal = input
        .goals
        .iter()
        .map(|g| g.trim())
        .find(|g| !g.is_empty())
        .unwrap_or("a stronger connection");

    let themes = [
        ("Listening with curiosity", "Practice reflecting back what your partner says before responding."),
        ("Expressing needs clearly", "Use 'I feel / I need' statements in low-stakes conversations."),
        ("Repairing after conflict", "Learn simple repair attempts that de-escalate tension."),
        ("Building rituals of connection", "Create small daily habits that keep you close."),
    ];

    let modules = (1..=duration_weeks.min(themes.len() as u32))
        .map(|week| {
            let (title, description) = themes[(week - 1) as usize];
            LearningModule {
                title: title.to_string(),
                description: description.to_string(),
                week,
                estimated_minutes: minutes,
                activities: vec![format!("Spend {} minutes on today's exercise", minutes)],
            }
        })
        .collect();

    LearningPath {
        title: "Relationship foundations".to_string(),
        description: format!("A starter program working toward {}.", primary_goal),
        duration_weeks,
        difficulty: input.current_level,
        modules,
        expected_outcomes: vec!["More confident, calmer conversations".to_string()],
        completion_probability: 0.6,
    }
}
