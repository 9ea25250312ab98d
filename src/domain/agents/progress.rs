//! Progress analysis over a window of completed coaching activities.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

use super::schema::{clamp_score, clamp_unit, require_input_text, AgentInput, OutputSchema, Violations};

const MAX_ACTIVITIES: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedActivity {
    pub activity_id: String,
    pub title: String,
    /// Self-reported usefulness on a 1 to 5 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInput {
    #[serde(default)]
    pub completed_activities: Vec<CompletedActivity>,
    #[serde(default)]
    pub goals: Vec<String>,
    /// Length of the analysed window in days.
    pub period_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_score: Option<f64>,
}

impl AgentInput for ProgressInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.period_days == 0 || self.period_days > 365 {
            return Err(ValidationError::out_of_range(
                "period_days",
                1.0,
                365.0,
                self.period_days as f64,
            ));
        }
        if self.completed_activities.len() > MAX_ACTIVITIES {
            return Err(ValidationError::too_many(
                "completed_activities",
                MAX_ACTIVITIES,
                self.completed_activities.len(),
            ));
        }
        for activity in &self.completed_activities {
            require_input_text("completed_activities.activity_id", &activity.activity_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTrend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressAnalysis {
    /// Overall progress in [0, 100].
    pub overall_progress: f64,
    /// Engagement over the window in [0, 100].
    pub engagement_score: f64,
    pub trend: ProgressTrend,
    pub summary: String,
    #[serde(default)]
    pub milestones: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    pub next_steps: Vec<String>,
    /// Likelihood of reaching current goals, in [0, 1].
    pub goal_completion_probability: f64,
}

impl OutputSchema for ProgressAnalysis {
    fn normalized(mut self) -> Self {
        self.overall_progress = clamp_score(self.overall_progress);
        self.engagement_score = clamp_score(self.engagement_score);
        self.goal_completion_probability = clamp_unit(self.goal_completion_probability);
        self
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Violations::new();
        v.require_text("summary", &self.summary)
            .require_items("next_steps", &self.next_steps)
            .require_each_text("next_steps", &self.next_steps)
            .require_each_text("milestones", &self.milestones)
            .require_each_text("areas_for_improvement", &self.areas_for_improvement);
        v.into_vec()
    }
}

/// Activity-count based estimate: roughly one activity every other day is full engagement.
pub fn fallback_progress(input: &ProgressInput) -> ProgressAnalysis {
    let expected = (input.period_days.max(1) as f64 / 2.0).max(1.0);
    let engagement = clamp_score(input.completed_activities.len() as f64 / expected * 100.0);
    let overall = clamp_score(input.previous_score.unwrap_or(engagement * 0.8));

    let trend = match input.previous_score {
        Some(prev) if engagement > prev + 5.0 => ProgressTrend::Improving,
        Some(prev) if engagement + 5.0 < prev => ProgressTrend::Declining,
        _ => ProgressTrend::Stable,
    };

    ProgressAnalysis {
        overall_progress: overall,
        engagement_score: engagement,
        trend,
        summary: format!(
            "You completed {} activities in the last {} days.",
            input.completed_activities.len(),
            input.period_days
        ),
        milestones: Vec::new(),
        areas_for_improvement: vec!["Keep a steady weekly rhythm".to_string()],
        next_steps: vec!["Pick one activity to repeat with your partner this week".to_string()],
        goal_completion_probability: clamp_unit(engagement / 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(done: usize, days: u32) -> ProgressInput {
        ProgressInput {
            completed_activities: (0..done)
                .map(|i| CompletedActivity {
                    activity_id: format!("a{}", i),
                    title: "Gratitude journal".to_string(),
                    rating: Some(4.0),
                })
                .collect(),
            goals: vec![],
            period_days: days,
            previous_score: None,
        }
    }

    #[test]
    fn period_must_be_positive() {
        assert!(input(0, 0).validate().is_err());
        assert!(input(0, 30).validate().is_ok());
    }

    #[test]
    fn fallback_caps_engagement() {
        let out = fallback_progress(&input(100, 14));
        assert_eq!(out.engagement_score, 100.0);
        assert!(out.goal_completion_probability <= 1.0);
        assert!(out.violations().is_empty());
    }

    #[test]
    fn fallback_detects_decline() {
        let mut i = input(1, 30);
        i.previous_score = Some(80.0);
        assert_eq!(fallback_progress(&i).trend, ProgressTrend::Declining);
    }
}
