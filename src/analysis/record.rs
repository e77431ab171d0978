//! The structured analysis record and its construction from loose model output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel for descriptive fields the model did not provide.
pub const UNKNOWN: &str = "unknown";

/// Sentinel for narrative fields the model did not provide.
pub const ANALYSIS_FAILED: &str = "analysis failed";

/// Input keys that historically carried golden quotes, in priority order.
const GOLDEN_QUOTE_KEYS: &[&str] = &["golden_quotes", "golden_sentences"];

/// Input keys that may carry the characteristics object.
const CHARACTERISTICS_KEYS: &[&str] = &[
    "blogger_characteristics",
    "creator_characteristics",
    "characteristics",
];

/// Text used by the placeholder record. Treated as sentinel content everywhere.
const PLACEHOLDER_TOPIC: &str = "content analysis failed";
const PLACEHOLDER_PAIN_POINT: &str = "could not be identified";
const PLACEHOLDER_VALUE: &str = "needs re-analysis";

/// Returns true if `value` carries no real information.
pub fn is_sentinel(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || [
            UNKNOWN,
            ANALYSIS_FAILED,
            PLACEHOLDER_TOPIC,
            PLACEHOLDER_PAIN_POINT,
            PLACEHOLDER_VALUE,
        ]
        .iter()
        .any(|s| trimmed.eq_ignore_ascii_case(s))
}

/// Which tier of the interpretation pipeline produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionTier {
    /// Parsed from a JSON object in the response.
    Structured,
    /// Recovered field by field from broken output.
    Fallback,
    /// Nothing usable; the placeholder record was substituted.
    #[default]
    Default,
}

impl std::fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionTier::Structured => write!(f, "structured"),
            ExtractionTier::Fallback => write!(f, "fallback"),
            ExtractionTier::Default => write!(f, "default"),
        }
    }
}

/// Descriptive traits of the creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characteristics {
    pub expertise: String,
    pub style: String,
    pub personality: String,
    pub experience_level: String,
}

impl Default for Characteristics {
    fn default() -> Self {
        Self {
            expertise: UNKNOWN.to_string(),
            style: UNKNOWN.to_string(),
            personality: UNKNOWN.to_string(),
            experience_level: UNKNOWN.to_string(),
        }
    }
}

impl Characteristics {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(map) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        Self {
            expertise: string_field(map, "expertise").unwrap_or_else(|| UNKNOWN.to_string()),
            style: string_field(map, "style").unwrap_or_else(|| UNKNOWN.to_string()),
            personality: string_field(map, "personality").unwrap_or_else(|| UNKNOWN.to_string()),
            experience_level: string_field(map, "experience_level")
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// The three narrative sub-insights behind the outreach rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologyMapping {
    pub trust_hook: String,
    pub empathy_anchor: String,
    pub value_map: String,
}

impl Default for MethodologyMapping {
    fn default() -> Self {
        Self {
            trust_hook: ANALYSIS_FAILED.to_string(),
            empathy_anchor: ANALYSIS_FAILED.to_string(),
            value_map: ANALYSIS_FAILED.to_string(),
        }
    }
}

impl MethodologyMapping {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(map) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        Self {
            trust_hook: string_field(map, "trust_hook").unwrap_or_else(|| ANALYSIS_FAILED.to_string()),
            empathy_anchor: string_field(map, "empathy_anchor")
                .unwrap_or_else(|| ANALYSIS_FAILED.to_string()),
            value_map: string_field(map, "value_map").unwrap_or_else(|| ANALYSIS_FAILED.to_string()),
        }
    }
}

/// Structured output of a content analysis.
///
/// Every field is always populated; missing data is represented by a sentinel
/// (`"unknown"`, `"analysis failed"`) or an empty list, never by absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub content_style: String,
    pub tone: String,
    pub target_audience: String,
    pub unique_approach: String,
    pub main_topics: Vec<String>,
    pub pain_points: Vec<String>,
    pub value_propositions: Vec<String>,
    pub characteristics: Characteristics,
    pub core_values: Vec<String>,
    /// Memorable sentences. Input may call these `golden_quotes` or `golden_sentences`.
    pub golden_quotes: Vec<String>,
    pub core_insight: String,
    pub core_insights: Vec<String>,
    pub methodology_mapping: MethodologyMapping,
    pub optimal_outreach_script: String,
    pub tier: ExtractionTier,
}

impl Default for AnalysisRecord {
    fn default() -> Self {
        Self::from_map(&Map::new(), ExtractionTier::Default)
    }
}

impl AnalysisRecord {
    /// Build a record from a loosely typed mapping, resolving aliases once.
    pub fn from_map(map: &Map<String, Value>, tier: ExtractionTier) -> Self {
        let core_insights = list_field(map, "core_insights");
        let core_insight = string_field(map, "core_insight")
            .or_else(|| {
                let joined = core_insights
                    .iter()
                    .filter(|s| !is_sentinel(s))
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" ");
                (!joined.is_empty()).then_some(joined)
            })
            .unwrap_or_else(|| ANALYSIS_FAILED.to_string());

        let golden_quotes = GOLDEN_QUOTE_KEYS
            .iter()
            .map(|key| list_field(map, key))
            .find(|quotes| !quotes.is_empty())
            .unwrap_or_default();

        let characteristics = Characteristics::from_value(
            CHARACTERISTICS_KEYS.iter().find_map(|key| map.get(*key)),
        );

        Self {
            content_style: string_field(map, "content_style").unwrap_or_else(|| UNKNOWN.to_string()),
            tone: string_field(map, "tone").unwrap_or_else(|| UNKNOWN.to_string()),
            target_audience: string_field(map, "target_audience")
                .unwrap_or_else(|| UNKNOWN.to_string()),
            unique_approach: string_field(map, "unique_approach")
                .unwrap_or_else(|| UNKNOWN.to_string()),
            main_topics: list_field(map, "main_topics"),
            pain_points: list_field(map, "pain_points"),
            value_propositions: list_field(map, "value_propositions"),
            characteristics,
            core_values: list_field(map, "core_values"),
            golden_quotes,
            core_insight,
            core_insights,
            methodology_mapping: MethodologyMapping::from_value(map.get("methodology_mapping")),
            optimal_outreach_script: string_field(map, "optimal_outreach_script")
                .unwrap_or_else(|| ANALYSIS_FAILED.to_string()),
            tier,
        }
    }

    /// The fixed record substituted when nothing could be extracted.
    pub fn placeholder() -> Self {
        Self {
            content_style: ANALYSIS_FAILED.to_string(),
            main_topics: vec![PLACEHOLDER_TOPIC.to_string()],
            pain_points: vec![PLACEHOLDER_PAIN_POINT.to_string()],
            value_propositions: vec![PLACEHOLDER_VALUE.to_string()],
            ..Self::default()
        }
    }

    /// Return a copy with the outreach script replaced.
    pub fn with_outreach_script(self, script: String) -> Self {
        Self {
            optimal_outreach_script: script,
            ..self
        }
    }

    /// Topics that carry real content, most prominent first.
    pub fn meaningful_topics(&self) -> impl Iterator<Item = &str> {
        self.main_topics.iter().map(String::as_str).filter(|s| !is_sentinel(s))
    }

    /// Pain points that carry real content, most pressing first.
    pub fn meaningful_pain_points(&self) -> impl Iterator<Item = &str> {
        self.pain_points.iter().map(String::as_str).filter(|s| !is_sentinel(s))
    }
}

/// Read a scalar field as a non-empty string. Numbers and booleans are stringified.
fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match map.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join(" "),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Read a list field. A bare string becomes a one-element list.
fn list_field(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
