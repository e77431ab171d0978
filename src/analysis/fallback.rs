//! Field-level recovery from responses the parser could not handle.
//!
//! This is deliberately approximate: values are captured up to the next quote
//! (escaped quotes are not understood) and list elements are every quoted
//! string inside the first bracket span after the key.

use super::record::is_sentinel;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Minimum number of meaningful fields for a recovery to count.
pub const MIN_MEANINGFUL_FIELDS: usize = 3;

const SCALAR_FIELDS: &[&str] = &[
    "content_style",
    "tone",
    "target_audience",
    "unique_approach",
    "core_insight",
    "optimal_outreach_script",
];

/// Scalars that belong under `methodology_mapping`.
const METHODOLOGY_FIELDS: &[&str] = &["trust_hook", "empathy_anchor", "value_map"];

const LIST_FIELDS: &[&str] = &[
    "core_values",
    "golden_sentences",
    "golden_quotes",
    "main_topics",
    "pain_points",
    "value_propositions",
    "core_insights",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FallbackError {
    #[error("only {found} meaningful field(s) recovered, need at least {MIN_MEANINGFUL_FIELDS}")]
    InsufficientFields { found: usize },
}

/// Regex miner for individual fields in degraded model output.
pub struct FallbackExtractor {
    scalars: Vec<(&'static str, Regex)>,
    methodology: Vec<(&'static str, Regex)>,
    lists: Vec<(&'static str, Regex)>,
    quoted: Regex,
}

impl FallbackExtractor {
    pub fn new() -> Self {
        let scalar = |field: &'static str| {
            let pattern = format!(r#""{}"\s*:\s*"([^"]*)""#, regex::escape(field));
            (field, Regex::new(&pattern).expect("Invalid regex"))
        };
        let list = |field: &'static str| {
            let pattern = format!(r#""{}"\s*:\s*\[([^\]]*)\]"#, regex::escape(field));
            (field, Regex::new(&pattern).expect("Invalid regex"))
        };

        Self {
            scalars: SCALAR_FIELDS.iter().copied().map(scalar).collect(),
            methodology: METHODOLOGY_FIELDS.iter().copied().map(scalar).collect(),
            lists: LIST_FIELDS.iter().copied().map(list).collect(),
            quoted: Regex::new(r#""([^"]*)""#).expect("Invalid regex"),
        }
    }

    /// Recover whatever fields can be found in `raw`.
    ///
    /// Fields that are not found are left out of the map; record construction
    /// fills them with sentinels.
    pub fn extract(&self, raw: &str) -> Result<Map<String, Value>, FallbackError> {
        let mut fields = Map::new();
        let mut meaningful = 0;

        for (field, pattern) in &self.scalars {
            if let Some(value) = capture_scalar(pattern, raw) {
                meaningful += usize::from(!is_sentinel(&value));
                fields.insert(field.to_string(), Value::String(value));
            }
        }

        let mut methodology = Map::new();
        for (field, pattern) in &self.methodology {
            if let Some(value) = capture_scalar(pattern, raw) {
                meaningful += usize::from(!is_sentinel(&value));
                methodology.insert(field.to_string(), Value::String(value));
            }
        }
        if !methodology.is_empty() {
            fields.insert("methodology_mapping".to_string(), Value::Object(methodology));
        }

        for (field, pattern) in &self.lists {
            let Some(span) = pattern.captures(raw).and_then(|c| c.get(1)) else {
                continue;
            };
            let items: Vec<Value> = self
                .quoted
                .captures_iter(span.as_str())
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect();
            meaningful += usize::from(items.iter().any(|v| v.as_str().is_some_and(|s| !is_sentinel(s))));
            fields.insert(field.to_string(), Value::Array(items));
        }

        debug!("Fallback extraction recovered {} meaningful field(s)", meaningful);

        if meaningful < MIN_MEANINGFUL_FIELDS {
            return Err(FallbackError::InsufficientFields { found: meaningful });
        }
        Ok(fields)
    }
}

impl Default for FallbackExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn capture_scalar(pattern: &Regex, raw: &str) -> Option<String> {
    pattern
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recovers_fields_from_broken_json() {
        let raw = r#"Analysis: {"content_style": "hands-on reviews", "tone": "blunt",
            "main_topics": ["headphones", "battery safety"
            "pain_points": ["fake specs"], oops the model stopped here"#;

        let fields = FallbackExtractor::new().extract(raw).unwrap();
        assert_eq!(fields["content_style"], json!("hands-on reviews"));
        assert_eq!(fields["tone"], json!("blunt"));
        assert_eq!(fields["pain_points"], json!(["fake specs"]));
        assert!(!fields.contains_key("target_audience"));
    }

    #[test]
    fn test_list_span_stops_at_first_bracket() {
        let raw = r#""main_topics": ["a", "b"], "value_propositions": ["c"], "tone": "warm""#;
        let fields = FallbackExtractor::new().extract(raw).unwrap();
        assert_eq!(fields["main_topics"], json!(["a", "b"]));
        assert_eq!(fields["value_propositions"], json!(["c"]));
    }

    #[test]
    fn test_methodology_fields_are_nested() {
        let raw = r#""trust_hook": "lab data", "empathy_anchor": "wasted money", "value_map": "buying guide""#;
        let fields = FallbackExtractor::new().extract(raw).unwrap();
        assert_eq!(
            fields["methodology_mapping"],
            json!({"trust_hook": "lab data", "empathy_anchor": "wasted money", "value_map": "buying guide"})
        );
    }

    #[test]
    fn test_sentinels_do_not_count() {
        let raw = r#""tone": "unknown", "content_style": "analysis failed", "target_audience": "", "main_topics": []"#;
        assert_eq!(
            FallbackExtractor::new().extract(raw),
            Err(FallbackError::InsufficientFields { found: 0 })
        );
    }

    #[test]
    fn test_two_fields_are_not_enough() {
        let raw = r#""tone": "warm", "main_topics": ["cooking"]"#;
        assert_eq!(
            FallbackExtractor::new().extract(raw),
            Err(FallbackError::InsufficientFields { found: 2 })
        );
    }

    #[test]
    fn test_plain_prose_recovers_nothing() {
        assert!(FallbackExtractor::new()
            .extract("I'm sorry, I can't analyze this transcript.")
            .is_err());
    }
}
