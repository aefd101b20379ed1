//! Universal JSON payload normalization.
//!
//! Turns an arbitrary client document into a flat payload the vector store
//! can index: reserved fields stripped, a `_text` field selected for
//! embedding, nested structure flattened (`a.b.c` → `a_b_c`, arrays capped at
//! 10 items), and a short `_hash` fingerprint of the text for change
//! detection. `process` is pure and idempotent on structurally equal inputs.

use serde_json::Value;

use crate::constants::tenancy::RESERVED_FIELDS;
use crate::value_objects::Payload;

/// Priority order for the `auto` text strategy.
const AUTO_TEXT_FIELDS: [&str; 8] = [
    "title",
    "name",
    "subject",
    "description",
    "content",
    "message",
    "text",
    "body",
];

/// Maximum recursion depth when collecting text leaves.
const COLLECT_MAX_DEPTH: usize = 5;
/// Arrays are flattened/collected up to this many items.
const ARRAY_ITEM_CAP: usize = 10;
/// Fallback text collection skips top-level strings at or above this length.
const FALLBACK_STRING_CAP: usize = 1000;

/// How `_text` is selected from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TextStrategy {
    /// First non-empty string among the priority fields, falling back to a
    /// concatenation of short top-level strings
    #[default]
    Auto,
    /// Recursive collection of all string/number leaves
    ConcatAll,
    /// Caller-specified field list
    Custom(Vec<String>),
}

/// Universal JSON payload normalizer.
#[derive(Debug, Clone, Default)]
pub struct PayloadNormalizer {
    strategy: TextStrategy,
}

impl PayloadNormalizer {
    /// Normalizer with the `auto` text strategy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer with an explicit text strategy
    #[must_use]
    pub fn with_strategy(strategy: TextStrategy) -> Self {
        Self { strategy }
    }

    /// Process a raw document into a flat payload with `_text` and `_hash`.
    #[must_use]
    pub fn process(&self, doc: &Payload) -> Payload {
        // Strip reserved fields plus previously-derived `_text` so the
        // operation is idempotent.
        let mut data = doc.clone();
        for reserved in RESERVED_FIELDS {
            data.remove(*reserved);
        }
        data.remove("_text");

        let text = self.extract_text(&data);

        let mut payload = Payload::new();
        payload.insert("_text".to_owned(), Value::String(text.clone()));
        payload.insert("_hash".to_owned(), Value::String(text_hash(&text)));
        flatten_into(&data, "", &mut payload);
        payload
    }

    fn extract_text(&self, data: &Payload) -> String {
        match &self.strategy {
            TextStrategy::Auto => {
                for field in AUTO_TEXT_FIELDS {
                    if let Some(Value::String(s)) = data.get(field)
                        && !s.trim().is_empty()
                    {
                        return s.clone();
                    }
                }
                // Fallback: short top-level strings in document order.
                let texts: Vec<&str> = data
                    .values()
                    .filter_map(|v| v.as_str())
                    .filter(|s| s.len() < FALLBACK_STRING_CAP)
                    .collect();
                texts.join(" ")
            }
            TextStrategy::ConcatAll => {
                let mut texts = Vec::new();
                for value in data.values() {
                    collect_texts(value, &mut texts, 0);
                }
                texts.join(" ")
            }
            TextStrategy::Custom(fields) => {
                let texts: Vec<String> = fields
                    .iter()
                    .filter_map(|f| data.get(f))
                    .filter(|v| !v.is_null())
                    .map(value_to_text)
                    .collect();
                texts.join(" ")
            }
        }
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn collect_texts(value: &Value, texts: &mut Vec<String>, depth: usize) {
    if depth > COLLECT_MAX_DEPTH {
        return;
    }
    match value {
        Value::Object(map) => {
            for v in map.values() {
                collect_texts(v, texts, depth + 1);
            }
        }
        Value::Array(items) => {
            for item in items.iter().take(ARRAY_ITEM_CAP) {
                collect_texts(item, texts, depth + 1);
            }
        }
        Value::String(s) if !s.trim().is_empty() => texts.push(s.trim().to_owned()),
        Value::Number(n) => texts.push(n.to_string()),
        Value::Bool(b) => texts.push(b.to_string()),
        _ => {}
    }
}

fn flatten_into(map: &Payload, prefix: &str, out: &mut Payload) {
    for (k, v) in map {
        let key = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}_{k}")
        };
        match v {
            Value::Object(inner) => flatten_into(inner, &key, out),
            Value::Array(items) => {
                for (i, item) in items.iter().take(ARRAY_ITEM_CAP).enumerate() {
                    let item_key = format!("{key}_{i}");
                    match item {
                        Value::Object(inner) => flatten_into(inner, &item_key, out),
                        other => {
                            out.insert(item_key, other.clone());
                        }
                    }
                }
            }
            other => {
                out.insert(key, other.clone());
            }
        }
    }
}

/// Short text fingerprint: MD5 hex truncated to 16 chars.
#[must_use]
pub fn text_hash(text: &str) -> String {
    let digest = md5::compute(text.as_bytes());
    format!("{digest:x}")[..16].to_owned()
}
