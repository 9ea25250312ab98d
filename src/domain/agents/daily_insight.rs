//! Daily insight: one short, actionable message per user per day.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

use super::schema::{clamp_unit, require_input_text, AgentInput, OutputSchema, Violations};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Communication,
    Intimacy,
    Trust,
    Conflict,
    Growth,
    Appreciation,
}

impl InsightCategory {
    fn from_focus(focus: &str) -> Self {
        let focus = focus.to_ascii_lowercase();
        if focus.contains("trust") {
            InsightCategory::Trust
        } else if focus.contains("conflict") || focus.contains("argument") {
            InsightCategory::Conflict
        } else if focus.contains("intima") {
            InsightCategory::Intimacy
        } else if focus.contains("grow") {
            InsightCategory::Growth
        } else if focus.contains("apprec") || focus.contains("gratitude") {
            InsightCategory::Appreciation
        } else {
            InsightCategory::Communication
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInsightInput {
    pub focus_area: String,
    /// Calendar day the insight is for (YYYY-MM-DD); part of the cache key.
    pub date: String,
    #[serde(default)]
    pub recent_moods: Vec<String>,
    #[serde(default)]
    pub streak_days: u32,
}

impl AgentInput for DailyInsightInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_input_text("focus_area", &self.focus_area)?;
        chrono::NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError::invalid_format("date", "expected YYYY-MM-DD"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInsight {
    pub title: String,
    pub message: String,
    pub category: InsightCategory,
    pub action_item: String,
    pub reflection_question: String,
    /// Relevance to the user's focus, in [0, 1].
    pub relevance_score: f64,
}

impl OutputSchema for DailyInsight {
    fn normalized(mut self) -> Self {
        self.relevance_score = clamp_unit(self.relevance_score);
        self
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Violations::new();
        v.require_text("title", &self.title)
            .require_text("message", &self.message)
            .require_text("action_item", &self.action_item)
            .require_text("reflection_question", &self.reflection_question);
        v.into_vec()
    }
}

pub fn fallback_daily_insight(input: &DailyInsightInput) -> DailyInsight {
    let category = InsightCategory::from_focus(&input.focus_area);
    let message = if input.streak_days > 1 {
        format!(
            "You have shown up for {} days in a row. Small, consistent moments of attention \
             build lasting closeness.",
            input.streak_days
        )
    } else {
        "Small, consistent moments of attention build lasting closeness.".to_string()
    };

    DailyInsight {
        title: "Small moments matter".to_string(),
        message,
        category,
        action_item: "Tell your partner one specific thing you appreciated today.".to_string(),
        reflection_question: "When did you feel most connected this week?".to_string(),
        relevance_score: 0.5,
    }
}
