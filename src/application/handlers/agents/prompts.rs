//! Prompt assembly shared by every agent operation.
//!
//! Prompts are pure functions of the typed input, the optional situational
//! context and the recent interaction history.

use serde::Serialize;
use serde_json::Value;

use crate::domain::orchestration::Prompt;
use crate::ports::Interaction;

const RESPONSE_RULES: &str = "Respond with a single JSON object and nothing else. \
Do not wrap it in prose. Every listed field is required.";

/// Builds a prompt from the agent's role, the expected output shape and the
/// operation's input.
pub fn compose<I: Serialize>(
    role: &str,
    output_shape: &str,
    task: &str,
    input: &I,
    context: Option<&Value>,
    history: &[Interaction],
) -> Prompt {
    let system = format!(
        "{}\n\n{}\n\nOutput shape:\n{}",
        role, RESPONSE_RULES, output_shape
    );

    let mut user = format!("{}\n\nInput:\n{}", task, render_json(input));

    if let Some(context) = context.filter(|c| !c.is_null()) {
        user.push_str("\n\nSituational context:\n");
        user.push_str(&render_json(context));
    }

    if !history.is_empty() {
        user.push_str("\n\nRecent interactions (oldest first):");
        for interaction in history {
            user.push_str(&format!(
                "\n- {}: {}",
                interaction.occurred_at.as_datetime().format("%Y-%m-%d"),
                interaction.summary
            ));
        }
    }

    Prompt::new(system, user)
}

fn render_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
