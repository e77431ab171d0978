//! Extraction of a JSON object from free-form model output.
//!
//! Models wrap JSON in code fences, surround it with prose, pretty-print string
//! values across lines and leave trailing commas. The parser locates the most
//! plausible `{...}` span, normalizes it, parses it strictly, and on failure
//! runs a single repair pass through a [`JsonRepair`] implementation.

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Why a response could not be turned into a JSON object.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("no structured data found in response")]
    NoStructuredData,

    #[error("structured data is not a JSON object")]
    NotAnObject,

    #[error("malformed JSON after repair: {0}")]
    Malformed(String),
}

/// A heuristic JSON repairer.
///
/// Returns `None` when it has nothing to offer, so callers can fail fast
/// instead of re-parsing identical text.
pub trait JsonRepair: Send + Sync {
    fn repair(&self, text: &str) -> Option<String>;
}

/// Regex-based repair of the two defects models produce most often.
pub struct RegexRepair {
    trailing_comma: Regex,
    split_strings: Regex,
}

impl RegexRepair {
    pub fn new() -> Self {
        Self {
            trailing_comma: Regex::new(r",\s*([}\]])").expect("Invalid regex"),
            split_strings: Regex::new(r#""[ \t]*\r?\n\s*""#).expect("Invalid regex"),
        }
    }
}

impl Default for RegexRepair {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRepair for RegexRepair {
    fn repair(&self, text: &str) -> Option<String> {
        let without_commas = self.trailing_comma.replace_all(text, "$1");
        let joined = self.split_strings.replace_all(&without_commas, "\", \"");
        (joined != text).then(|| joined.into_owned())
    }
}

/// Parses a JSON object out of raw model output.
pub struct ResponseParser<R: JsonRepair = RegexRepair> {
    repairer: R,
    line_break: Regex,
}

impl ResponseParser<RegexRepair> {
    pub fn new() -> Self {
        Self::with_repairer(RegexRepair::new())
    }
}

impl Default for ResponseParser<RegexRepair> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: JsonRepair> ResponseParser<R> {
    /// Use a different repair strategy.
    pub fn with_repairer(repairer: R) -> Self {
        Self {
            repairer,
            line_break: Regex::new(r"\r?\n\s*").expect("Invalid regex"),
        }
    }

    /// Extract the JSON object contained in `raw`.
    pub fn parse(&self, raw: &str) -> Result<Map<String, Value>, ParseError> {
        let span = locate_json_span(raw).ok_or(ParseError::NoStructuredData)?;
        debug!("Located JSON span of {} bytes", span.len());

        let first_error = match parse_object(&self.normalize(span)) {
            Ok(map) => return Ok(map),
            Err(e) => e,
        };

        let Some(repaired) = self.repairer.repair(span) else {
            warn!("JSON parse failed and no repair applied: {}", first_error);
            return Err(first_error);
        };

        debug!("Retrying parse after repair");
        parse_object(&self.normalize(&repaired)).inspect_err(|e| {
            warn!("JSON parse failed after repair: {}", e);
        })
    }

    /// Collapse every line break and the indentation that follows into one space.
    pub fn normalize(&self, span: &str) -> String {
        self.line_break.replace_all(span, " ").into_owned()
    }
}

fn parse_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ParseError::NotAnObject),
        Err(e) => Err(ParseError::Malformed(e.to_string())),
    }
}

/// Find the text most likely to hold the JSON object.
///
/// First match wins: a fence tagged `json`; any fenced block containing `{`
/// (narrowed to its outermost braces); the outermost braces of the whole text.
pub fn locate_json_span(text: &str) -> Option<&str> {
    tagged_json_block(text)
        .or_else(|| fenced_block_with_object(text))
        .or_else(|| brace_span(text))
}

fn tagged_json_block(text: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let start = lower.find(JSON_FENCE)? + JSON_FENCE.len();
    let rest = &text[start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    let block = rest[..end].trim();
    (!block.is_empty()).then_some(block)
}

fn fenced_block_with_object(text: &str) -> Option<&str> {
    let parts: Vec<&str> = text.split(FENCE).collect();
    // Odd indices are inside a fence; the last part is only a block if closed.
    parts
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 2 == 1 && *i + 1 < parts.len())
        .find_map(|(_, block)| brace_span(block))
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
