//! Payload filter grammar.
//!
//! Boolean `must` / `should` / `must_not` over field equality conditions.
//! The pipeline uses this for tenant and access-level scoping; the in-memory
//! store evaluates it directly, the Qdrant provider serializes it to the
//! backend's native form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::vectors::Payload;

/// Value matcher for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchValue {
    /// Field must equal this value
    Value(Value),
    /// Field must equal any of these values
    Any(Vec<Value>),
}

/// A single field condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    /// Payload key (flattened form)
    pub key: String,
    /// Matcher applied to the field value
    #[serde(rename = "match")]
    pub matches: MatchValue,
}

impl FieldCondition {
    fn is_satisfied(&self, payload: &Payload) -> bool {
        let Some(actual) = payload.get(&self.key) else {
            return false;
        };
        match &self.matches {
            MatchValue::Value(expected) => actual == expected,
            MatchValue::Any(options) => options.iter().any(|v| v == actual),
        }
    }
}

/// Boolean combination of field conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// All of these must hold
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<FieldCondition>,
    /// At least one of these must hold (when non-empty)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<FieldCondition>,
    /// None of these may hold
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<FieldCondition>,
}

impl Filter {
    /// Empty filter matching everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `must` equality condition
    #[must_use]
    pub fn must_match<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.must.push(FieldCondition {
            key: key.into(),
            matches: MatchValue::Value(value.into()),
        });
        self
    }

    /// Add a `must` any-of condition
    #[must_use]
    pub fn must_match_any<K: Into<String>>(mut self, key: K, values: Vec<Value>) -> Self {
        self.must.push(FieldCondition {
            key: key.into(),
            matches: MatchValue::Any(values),
        });
        self
    }

    /// Add a `must_not` equality condition
    #[must_use]
    pub fn must_not_match<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.must_not.push(FieldCondition {
            key: key.into(),
            matches: MatchValue::Value(value.into()),
        });
        self
    }

    /// True when no conditions are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }

    /// Evaluate the filter against a payload
    #[must_use]
    pub fn matches(&self, payload: &Payload) -> bool {
        if !self.must.iter().all(|c| c.is_satisfied(payload)) {
            return false;
        }
        if !self.should.is_empty() && !self.should.iter().any(|c| c.is_satisfied(payload)) {
            return false;
        }
        self.must_not.iter().all(|c| !c.is_satisfied(payload))
    }
}
