//! Assessment analysis: scores a completed relationship assessment.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;
use crate::domain::orchestration::Priority;

use super::schema::{
    clamp_score, clamp_unit, require_input_items, require_input_text, AgentInput, OutputSchema,
    Violations,
};

/// Upper bound on answers accepted in a single assessment.
pub const MAX_ANSWERS: usize = 200;

/// A completed assessment submitted for analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentInput {
    /// Assessment kind, e.g. "attachment_style" or "love_languages".
    pub assessment_type: String,
    pub answers: Vec<AssessmentAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_stage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentAnswer {
    pub question_id: String,
    #[serde(default)]
    pub question: String,
    pub answer: String,
    /// Self-rated score for the question on a 0 to 100 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl AgentInput for AssessmentInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_input_text("assessment_type", &self.assessment_type)?;
        require_input_items("answers", &self.answers, MAX_ANSWERS)?;
        for answer in &self.answers {
            require_input_text("answers.question_id", &answer.question_id)?;
            if let Some(score) = answer.score {
                if !score.is_finite() {
                    return Err(ValidationError::invalid_format(
                        "answers.score",
                        "must be a finite number",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Band the overall score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCategory {
    NeedsAttention,
    Developing,
    Healthy,
    Thriving,
}

impl HealthCategory {
    pub fn for_score(score: f64) -> Self {
        match clamp_score(score) {
            s if s < 40.0 => HealthCategory::NeedsAttention,
            s if s < 65.0 => HealthCategory::Developing,
            s if s < 85.0 => HealthCategory::Healthy,
            _ => HealthCategory::Thriving,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub description: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

/// Analysis of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentAnalysis {
    /// Overall score in [0, 100].
    pub score: f64,
    pub category: HealthCategory,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub growth_areas: Vec<String>,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
}

impl OutputSchema for AssessmentAnalysis {
    fn normalized(mut self) -> Self {
        self.score = clamp_score(self.score);
        for insight in &mut self.insights {
            insight.confidence = clamp_unit(insight.confidence);
        }
        self
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Violations::new();
        v.require_text("summary", &self.summary)
            .require_items("insights", &self.insights)
            .require_items("recommendations", &self.recommendations)
            .require_each_text("strengths", &self.strengths)
            .require_each_text("growth_areas", &self.growth_areas);
        for (i, insight) in self.insights.iter().enumerate() {
            v.require_text(&format!("insights[{}].title", i), &insight.title)
                .require_text(&format!("insights[{}].description", i), &insight.description);
        }
        for (i, rec) in self.recommendations.iter().enumerate() {
            v.require_text(&format!("recommendations[{}].title", i), &rec.title)
                .require_text(&format!("recommendations[{}].description", i), &rec.description);
        }
        v.into_vec()
    }
}

/// Neutral analysis used when the provider cannot produce one.
///
/// The score is the mean of self-rated answer scores when any were given,
/// otherwise the midpoint.
pub fn fallback_assessment(input: &AssessmentInput) -> AssessmentAnalysis {
    let rated: Vec<f64> = input
        .answers
        .iter()
        .filter_map(|a| a.score)
        .filter(|s| s.is_finite())
        .collect();
    let score = if rated.is_empty() {
        50.0
    } else {
        clamp_score(rated.iter().sum::<f64>() / rated.len() as f64)
    };

    AssessmentAnalysis {
        score,
        category: HealthCategory::for_score(score),
        summary: format!(
            "We received your {} assessment with {} answers. A detailed analysis is not \
             available right now, so here is a general starting point.",
            input.assessment_type.trim(),
            input.answers.len()
        ),
        strengths: vec!["You are investing time in understanding your relationship".to_string()],
        growth_areas: vec!["Regular, open conversations about needs".to_string()],
        insights: vec![Insight {
            title: "Reflection is a strength".to_string(),
            description: "Completing an assessment shows willingness to look honestly at how \
                          you relate to your partner."
                .to_string(),
            confidence: 0.5,
        }],
        recommendations: vec![Recommendation {
            title: "Schedule a weekly check-in".to_string(),
            description: "Set aside 20 minutes each week to share one appreciation and one \
                          need with your partner."
                .to_string(),
            priority: Priority::Medium,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agents::schema::parse_output;

    fn input(scores: &[Option<f64>]) -> AssessmentInput {
        AssessmentInput {
            assessment_type: "attachment_style".to_string(),
            answers: scores
                .iter()
                .enumerate()
                .map(|(i, s)| AssessmentAnswer {
                    question_id: format!("q{}", i),
                    question: "How often do you feel heard?".to_string(),
                    answer: "Often".to_string(),
                    score: *s,
                })
                .collect(),
            relationship_stage: None,
        }
    }

    #[test]
    fn input_requires_answers() {
        assert!(input(&[]).validate().is_err());
        assert!(input(&[Some(70.0)]).validate().is_ok());
    }

    #[test]
    fn fallback_is_schema_valid_and_in_range() {
        let out = fallback_assessment(&input(&[Some(250.0), Some(150.0)]));
        assert_eq!(out.score, 100.0);
        assert!(out.violations().is_empty());
        assert!(!out.insights.is_empty());
        assert!(!out.recommendations.is_empty());
    }

    #[test]
    fn fallback_uses_midpoint_without_scores() {
        let out = fallback_assessment(&input(&[None]));
        assert_eq!(out.score, 50.0);
        assert_eq!(out.category, HealthCategory::Developing);
    }

    #[test]
    fn parsed_output_is_clamped() {
        let raw = r#"{
            "score": 130,
            "category": "thriving",
            "summary": "Strong bond",
            "insights": [{"title": "t", "description": "d", "confidence": 4}],
            "recommendations": [{"title": "t", "description": "d", "priority": "high"}]
        }"#;
        let out: AssessmentAnalysis = parse_output(raw).unwrap();
        assert_eq!(out.score, 100.0);
        assert_eq!(out.insights[0].confidence, 1.0);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let raw = r#"{
            "score": 60, "category": "amazing", "summary": "s",
            "insights": [{"title": "t", "description": "d", "confidence": 0.5}],
            "recommendations": [{"title": "t", "description": "d", "priority": "low"}]
        }"#;
        assert!(parse_output::<AssessmentAnalysis>(raw).is_err());
    }

    #[test]
    fn empty_insights_violate_schema() {
        let raw = r#"{
            "score": 60, "category": "healthy", "summary": "s",
            "insights": [],
            "recommendations": [{"title": "t", "description": "d", "priority": "low"}]
        }"#;
        assert!(parse_output::<AssessmentAnalysis>(raw).is_err());
    }

    #[test]
    fn category_bands() {
        assert_eq!(HealthCategory::for_score(10.0), HealthCategory::NeedsAttention);
        assert_eq!(HealthCategory::for_score(70.0), HealthCategory::Healthy);
        assert_eq!(HealthCategory::for_score(99.0), HealthCategory::Thriving);
    }
}
