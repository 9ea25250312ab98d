//! Deterministic request fingerprints used as cache keys.
//!
//! Two payloads that differ only in object key order, surrounding whitespace
//! of string values, or transient bookkeeping fields produce the same
//! fingerprint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

use super::{AgentOperation, AgentType};

/// Keys dropped at any depth before hashing.
pub const TRANSIENT_KEYS: &[&str] = &[
    "timestamp",
    "created_at",
    "updated_at",
    "requested_at",
    "request_id",
    "trace_id",
    "nonce",
];

/// Lowercase hex SHA-256 digest identifying a normalized request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint for an agent type, operation and payload.
    pub fn compute(agent_type: AgentType, operation: AgentOperation, payload: &Value) -> Self {
        let canonical = canonical_json(payload);
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}:{}", agent_type.as_str(), operation.as_str(), canonical));
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Wraps an already computed digest (e.g. read back from a store key).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns a normalized copy of `value`: keys sorted, strings trimmed,
/// transient keys removed.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map
                .keys()
                .filter(|k| !TRANSIENT_KEYS.contains(&k.as_str()))
                .collect();
            keys.sort();

            let mut normalized = Map::new();
            for key in keys {
                normalized.insert(key.clone(), normalize(&map[key]));
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other.clone(),
    }
}

/// Serializes the normalized payload. Keys are inserted in sorted order, so
/// the output is stable whether or not serde_json preserves insertion order.
pub fn canonical_json(value: &Value) -> String {
    normalize(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn fp(payload: &Value) -> Fingerprint {
        Fingerprint::compute(
            AgentType::AssessmentAnalysis,
            AgentOperation::AnalyzeAssessment,
            payload,
        )
    }

    #[test]
    fn key_order_does_not_matter() {
        let a = json!({"answers": [1, 2], "kind": "attachment", "nested": {"x": 1, "y": 2}});
        let b = json!({"nested": {"y": 2, "x": 1}, "kind": "attachment", "answers": [1, 2]});
        assert_eq!(fp(&a), fp(&b));
    }

    #[test]
    fn transient_fields_are_ignored_at_any_depth() {
        let a = json!({"kind": "love_languages", "meta": {"timestamp": "2024-01-01", "source": "web"}});
        let b = json!({"kind": "love_languages", "request_id": "abc", "meta": {"source": "web"}});
        assert_eq!(fp(&a), fp(&b));
    }

    #[test]
    fn string_whitespace_is_trimmed() {
        assert_eq!(fp(&json!({"goal": " trust "})), fp(&json!({"goal": "trust"})));
    }

    #[test]
    fn array_order_is_significant() {
        assert_ne!(fp(&json!({"a": [1, 2]})), fp(&json!({"a": [2, 1]})));
    }

    #[test]
    fn operation_is_part_of_the_key() {
        let payload = json!({"message": "hello"});
        let coach = Fingerprint::compute(
            AgentType::CommunicationCoaching,
            AgentOperation::CoachCommunication,
            &payload,
        );
        let conflict = Fingerprint::compute(
            AgentType::CommunicationCoaching,
            AgentOperation::ResolveConflict,
            &payload,
        );
        assert_ne!(coach, conflict);
    }

    #[test]
    fn fingerprint_is_lowercase_hex_sha256() {
        let value = fp(&json!({}));
        assert_eq!(value.as_str().len(), 64);
        assert!(value.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    proptest! {
        #[test]
        fn insertion_order_never_changes_fingerprint(
            entries in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..12)
        ) {
            let forward: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), json!(v)))
                .collect();
            let reversed: Map<String, Value> = entries
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), json!(v)))
                .collect();

            prop_assert_eq!(fp(&Value::Object(forward)), fp(&Value::Object(reversed)));
        }
    }
}
