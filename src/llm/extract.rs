//! Best-effort JSON extraction from free-form model output.
//!
//! Policy, in order:
//! 1. If a fenced code block is present, keep only its body.
//! 2. Parse the remaining text directly.
//! 3. Parse the first `{...}` span, then the first `[...]` span.
//! 4. Give up and hand back the original text untouched.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

pub const PARSE_FAILURE: &str = "Failed to parse AI response";

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").unwrap());
static OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());
static ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[\s\S]*\]").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Parsed(Value),
    Unparsable { raw: String },
}

impl Extracted {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Extracted::Parsed(_))
    }

    /// The parsed value, or the `{"error", "raw"}` sentinel object.
    pub fn into_value(self) -> Value {
        match self {
            Extracted::Parsed(value) => value,
            Extracted::Unparsable { raw } => json!({ "error": PARSE_FAILURE, "raw": raw }),
        }
    }
}

/// Model output that could not be turned into the requested shape.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Failed to parse AI response")]
pub struct Unparsable {
    pub raw: String,
}

pub fn extract_json(text: &str) -> Extracted {
    let trimmed = text.trim();
    let candidate = match FENCE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim(),
        None => trimmed,
    };

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        return Extracted::Parsed(value);
    }

    for pattern in [&*OBJECT, &*ARRAY] {
        if let Some(m) = pattern.find(candidate) {
            if let Ok(value) = serde_json::from_str::<Value>(m.as_str()) {
                return Extracted::Parsed(value);
            }
        }
    }

    Extracted::Unparsable { raw: text.to_string() }
}

/// Extract and deserialize into a typed result.
///
/// `null` members are dropped first so `#[serde(default)]` fields fall back
/// to their defaults instead of failing.
pub fn extract_as<T: DeserializeOwned>(text: &str) -> Result<T, Unparsable> {
    match extract_json(text) {
        Extracted::Parsed(value) => {
            decode(value).map_err(|e| {
                tracing::warn!("model output did not match expected shape: {e}");
                Unparsable { raw: text.to_string() }
            })
        }
        Extracted::Unparsable { raw } => {
            tracing::warn!(preview = %preview(&raw), "{}", PARSE_FAILURE);
            Err(Unparsable { raw })
        }
    }
}

/// Deserialize an already extracted value, dropping `null` members first.
pub fn decode<T: DeserializeOwned>(mut value: Value) -> Result<T, serde_json::Error> {
    strip_nulls(&mut value);
    serde_json::from_value(value)
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}
