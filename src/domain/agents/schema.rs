//! Declarative output validation.
//!
//! Provider text is parsed into a typed output with serde (required fields and
//! closed enumerations), numeric fields are clamped into their documented
//! ranges, and the remaining structural rules are checked by
//! [`OutputSchema::violations`]. The result is either a fully valid value or
//! a [`SchemaError`]; partially coerced objects never escape.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Inclusive bounds for percentage-like scores.
pub const SCORE_RANGE: (f64, f64) = (0.0, 100.0);
/// Inclusive bounds for probabilities and confidences.
pub const UNIT_RANGE: (f64, f64) = (0.0, 1.0);
/// Inclusive bounds for program lengths in weeks.
pub const WEEKS_RANGE: (u32, u32) = (1, 52);
/// Inclusive bounds for activity durations in minutes.
pub const MINUTES_RANGE: (u32, u32) = (5, 240);

/// Validation failure of a provider payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("malformed output: {0}")]
    Malformed(String),

    #[error("output violates schema: {}", .0.join("; "))]
    Violations(Vec<String>),
}

/// Contract implemented by every agent output type.
pub trait OutputSchema: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Clamps every numeric field into its documented range.
    fn normalized(self) -> Self;

    /// Rules serde cannot express: non-empty lists and non-blank text.
    fn violations(&self) -> Vec<String>;
}

/// Caller-supplied input types validate themselves before any provider call.
pub trait AgentInput: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Parses raw provider text into a validated, normalized output.
pub fn parse_output<O: OutputSchema>(raw: &str) -> Result<O, SchemaError> {
    let json = extract_json(raw)
        .ok_or_else(|| SchemaError::Malformed("no JSON object found".to_string()))?;

    let output: O =
        serde_json::from_str(json).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    let output = output.normalized();

    let violations = output.violations();
    if violations.is_empty() {
        Ok(output)
    } else {
        Err(SchemaError::Violations(violations))
    }
}

/// Locates the JSON object inside provider text.
///
/// Accepts bare JSON, JSON inside a Markdown code fence, and JSON surrounded
/// by prose (first `{` through last `}`).
pub fn extract_json(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();

    let body = match trimmed.find("```") {
        Some(open) => {
            let after_fence = &trimmed[open + 3..];
            let content_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
            let content = &after_fence[content_start..];
            match content.find("```") {
                Some(close) => &content[..close],
                None => content,
            }
        }
        None => trimmed,
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&body[start..=end])
}

pub fn clamp_score(value: f64) -> f64 {
    clamp_f64(value, SCORE_RANGE)
}

pub fn clamp_unit(value: f64) -> f64 {
    clamp_f64(value, UNIT_RANGE)
}

pub fn clamp_weeks(value: u32) -> u32 {
    value.clamp(WEEKS_RANGE.0, WEEKS_RANGE.1)
}

pub fn clamp_minutes(value: u32) -> u32 {
    value.clamp(MINUTES_RANGE.0, MINUTES_RANGE.1)
}

fn clamp_f64(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Collects schema violations with field paths.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_text(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.0.push(format!("{} must not be blank", field));
        }
        self
    }

    pub fn require_items<T>(&mut self, field: &str, items: &[T]) -> &mut Self {
        if items.is_empty() {
            self.0.push(format!("{} must contain at least one item", field));
        }
        self
    }

    pub fn require_each_text(&mut self, field: &str, items: &[String]) -> &mut Self {
        for (i, item) in items.iter().enumerate() {
            if item.trim().is_empty() {
                self.0.push(format!("{}[{}] must not be blank", field, i));
            }
        }
        self
    }

    pub fn extend(&mut self, prefix: &str, nested: Vec<String>) -> &mut Self {
        self.0
            .extend(nested.into_iter().map(|v| format!("{}.{}", prefix, v)));
        self
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Input-side helper mirroring [`Violations`] for caller payloads.
pub fn require_input_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    Ok(())
}

pub fn require_input_items<T>(field: &str, items: &[T], max: usize) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    if items.len() > max {
        return Err(ValidationError::too_many(field, max, items.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Sample {
        score: f64,
        notes: Vec<String>,
    }

    impl OutputSchema for Sample {
        fn normalized(mut self) -> Self {
            self.score = clamp_score(self.score);
            self
        }

        fn violations(&self) -> Vec<String> {
            let mut v = Violations::new();
            v.require_items("notes", &self.notes)
                .require_each_text("notes", &self.notes);
            v.into_vec()
        }
    }

    #[test]
    fn extracts_bare_json() {
        assert_eq!(extract_json("{\"a\":1}"), Some("{\"a\":1}"));
    }

    #[test]
    fn extracts_fenced_json() {
        let raw = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(extract_json(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn extracts_json_in_prose() {
        let raw = "Sure! {\"a\": {\"b\": 2}} Hope that helps.";
        assert_eq!(extract_json(raw), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn no_object_is_none() {
        assert_eq!(extract_json("I cannot help with that."), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn parse_clamps_before_validating() {
        let out: Sample = parse_output("{\"score\": 140, \"notes\": [\"ok\"]}").unwrap();
        assert_eq!(out.score, 100.0);
    }

    #[test]
    fn parse_reports_violations() {
        let err = parse_output::<Sample>("{\"score\": 40, \"notes\": []}").unwrap_err();
        assert!(matches!(err, SchemaError::Violations(v) if v.len() == 1));
    }

    #[test]
    fn parse_reports_missing_fields_as_malformed() {
        let err = parse_output::<Sample>("{\"score\": 40}").unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(_)));
    }

    #[test]
    fn clamps_cover_ranges() {
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_weeks(0), 1);
        assert_eq!(clamp_weeks(80), 52);
        assert_eq!(clamp_minutes(1), 5);
        assert_eq!(clamp_minutes(600), 240);
    }
}
