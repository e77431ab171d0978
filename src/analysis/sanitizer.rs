//! Post-processing of the outreach script.
//!
//! A script that is empty, carries leaked template text, or lacks the sender
//! identity is recomposed from the extracted data. Anything else gets minimal
//! touch-ups: addressee name, methodology parenthetical and one concrete
//! scenario when none of the extracted data is referenced yet. The result is
//! always scrubbed of denylisted fragments, and sanitizing twice is a no-op.

use super::record::{is_sentinel, AnalysisRecord};
use crate::config::OutreachSettings;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// Characters of a golden quote kept in a composed script.
const QUOTE_PREVIEW_CHARS: usize = 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SanitizeError {
    #[error("sender identity is not configured")]
    MissingIdentity,

    #[error("sanitized script violates an invariant: {0}")]
    Invariant(&'static str),
}

/// Extracted data available to the sanitizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptContext<'a> {
    pub golden_quotes: &'a [String],
    pub main_topics: &'a [String],
    pub pain_points: &'a [String],
    pub addressee: Option<&'a str>,
}

impl<'a> ScriptContext<'a> {
    pub fn from_record(record: &'a AnalysisRecord, addressee: Option<&'a str>) -> Self {
        Self {
            golden_quotes: &record.golden_quotes,
            main_topics: &record.main_topics,
            pain_points: &record.pain_points,
            addressee,
        }
    }
}

/// Context values with sentinels dropped and denylisted fragments removed.
struct Material {
    name: Option<String>,
    quote: Option<String>,
    topic: Option<String>,
    pain_point: Option<String>,
    /// Lowercased snippets whose presence means the data is already woven in.
    markers: Vec<String>,
}

pub struct ScriptSanitizer {
    identity: String,
    terms: [String; 3],
    /// ASCII-lowercased denylist fragments.
    denylist: Vec<String>,
    greeting: Regex,
}

impl ScriptSanitizer {
    pub fn new(settings: &OutreachSettings) -> Self {
        Self {
            identity: settings.sender_identity.trim().to_string(),
            terms: settings.methodology_terms.clone(),
            denylist: settings
                .denylist
                .iter()
                .map(|f| f.to_ascii_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
            // Greeting word, an optional generic "there", then optional punctuation.
            greeting: Regex::new(r"(?i)^(\s*)(hi|hello|hey|dear|你好|您好)(?:\s+there)?(?:\s*([,!.，！。])\s*|\s+|$)")
                .expect("Invalid regex"),
        }
    }

    /// Sanitize `script`, returning it unchanged if sanitization fails.
    pub fn sanitize(&self, script: &str, context: &ScriptContext<'_>) -> String {
        match self.try_sanitize(script, context) {
            Ok(sanitized) => sanitized,
            Err(e) => {
                warn!("Keeping outreach script as generated: {}", e);
                script.to_string()
            }
        }
    }

    pub fn try_sanitize(
        &self,
        script: &str,
        context: &ScriptContext<'_>,
    ) -> Result<String, SanitizeError> {
        if self.identity.is_empty() {
            return Err(SanitizeError::MissingIdentity);
        }

        let material = self.material(context);
        let draft = if self.needs_rewrite(script) {
            debug!("Outreach script needs a rewrite");
            self.compose(&material)
        } else {
            self.touch_up(script.trim(), &material)
        };

        let sanitized = self.scrub(&draft).trim().to_string();
        if sanitized.is_empty() {
            return Err(SanitizeError::Invariant("script is empty"));
        }
        if !sanitized.contains(&self.identity) {
            return Err(SanitizeError::Invariant("sender identity was scrubbed"));
        }
        Ok(sanitized)
    }

    /// Whether the script must be recomposed rather than touched up.
    pub fn needs_rewrite(&self, script: &str) -> bool {
        script.trim().is_empty()
            || self.find_fragment(script).is_some()
            || !script.contains(&self.identity)
    }

    fn compose(&self, material: &Material) -> String {
        let mut sentences = vec![match &material.name {
            Some(name) => format!("Hi {},", name),
            None => "Hi there,".to_string(),
        }];

        if let Some(quote) = &material.quote {
            sentences.push(format!("your line \"{}\" stayed with me.", preview(quote)));
        }
        sentences.push(format!(
            "I'm {}, and I study what makes creator content genuinely connect with an audience.",
            self.identity
        ));
        if let Some(scenario) = scenario(material) {
            sentences.push(scenario);
        }
        sentences.push(
            "Would you be open to a short chat about whether that matches what you see from your viewers?"
                .to_string(),
        );
        sentences.push(self.parenthetical());

        sentences.join(" ")
    }

    fn touch_up(&self, script: &str, material: &Material) -> String {
        let mut text = script.to_string();

        if let Some(name) = &material.name {
            if !contains_word(&text, name) {
                text = self.inject_name(&text, name);
            }
        }

        let lowered = text.to_lowercase();
        let woven = material.markers.iter().any(|m| lowered.contains(m.as_str()));
        if !woven {
            let clause = scenario(material)
                .or_else(|| material.quote.as_ref().map(|q| format!("Your line \"{}\" stayed with me.", preview(q))));
            if let Some(clause) = clause {
                text = format!("{} {}", text, clause);
            }
        }

        if !self.terms.iter().any(|t| contains_ignore_case(&text, t)) {
            text = format!("{} {}", text, self.parenthetical());
        }

        text
    }

    /// Put the name right after the greeting word. Only the greeting, a
    /// generic "there" and the punctuation after them are rewritten.
    fn inject_name(&self, script: &str, name: &str) -> String {
        match self.greeting.captures(script) {
            Some(caps) => {
                let end = caps.get(0).map_or(0, |m| m.end());
                let lead = caps.get(1).map_or("", |m| m.as_str());
                let word = caps.get(2).map_or("Hi", |m| m.as_str());
                let terminator = caps.get(3).map_or(",", |m| m.as_str());
                let rest = &script[end..];
                if rest.is_empty() {
                    format!("{}{} {}{}", lead, word, name, terminator)
                } else {
                    format!("{}{} {}{} {}", lead, word, name, terminator, rest)
                }
            }
            None => format!("Hi {}, {}", name, script),
        }
    }

    fn parenthetical(&self) -> String {
        format!("({})", self.terms.join(", "))
    }

    fn material(&self, context: &ScriptContext<'_>) -> Material {
        let clean = |value: &str| {
            let cleaned = self.scrub(value).trim().to_string();
            (!is_sentinel(&cleaned)).then_some(cleaned)
        };

        let quotes: Vec<String> = context.golden_quotes.iter().filter_map(|q| clean(q)).collect();
        let topics: Vec<String> = context.main_topics.iter().filter_map(|t| clean(t)).collect();
        let pain_points: Vec<String> = context.pain_points.iter().filter_map(|p| clean(p)).collect();

        let markers = quotes
            .iter()
            .map(|q| truncate_chars(q, QUOTE_PREVIEW_CHARS).trim_end().to_lowercase())
            .chain(topics.iter().chain(&pain_points).map(|s| s.to_lowercase()))
            .collect();

        Material {
            name: context.addressee.and_then(clean),
            quote: quotes.into_iter().next(),
            topic: topics.into_iter().next(),
            pain_point: pain_points.into_iter().next(),
            markers,
        }
    }

    /// Remove every denylisted fragment, matching ASCII case-insensitively.
    fn scrub(&self, text: &str) -> String {
        let mut result = text.to_string();
        while let Some((start, end)) = self.find_fragment(&result) {
            result.replace_range(start..end, "");
            if result[..start].ends_with(' ') && result[start..].starts_with(' ') {
                result.remove(start);
            }
        }
        result
    }

    fn find_fragment(&self, text: &str) -> Option<(usize, usize)> {
        // ASCII lowercasing keeps byte offsets aligned with `text`.
        let lowered = text.to_ascii_lowercase();
        self.denylist
            .iter()
            .filter_map(|f| lowered.find(f.as_str()).map(|start| (start, start + f.len())))
            .min()
    }
}

fn scenario(material: &Material) -> Option<String> {
    match (&material.pain_point, &material.topic) {
        (Some(pain), Some(topic)) => Some(format!(
            "For example, when your viewers run into {}, the way you unpack {} gives them a concrete next step.",
            pain, topic
        )),
        (Some(pain), None) => Some(format!(
            "For example, you speak directly to viewers who are dealing with {}.",
            pain
        )),
        (None, Some(topic)) => Some(format!(
            "For example, the way you unpack {} gives newcomers a concrete starting point.",
            topic
        )),
        (None, None) => None,
    }
}

fn preview(quote: &str) -> String {
    let truncated = truncate_chars(quote, QUOTE_PREVIEW_CHARS);
    if truncated.len() < quote.len() {
        format!("{}...", truncated.trim_end())
    } else {
        truncated.to_string()
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive match of `word` not embedded in a longer ASCII word,
/// so `Al` does not match inside "also". CJK names match anywhere.
fn contains_word(haystack: &str, word: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let word = word.to_lowercase();
    if word.is_empty() {
        return true;
    }
    haystack.match_indices(word.as_str()).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        let joins = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        let word_start = word.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
        let word_end = word.chars().next_back().is_some_and(|c| c.is_ascii_alphanumeric());
        !(word_start && joins(before)) && !(word_end && joins(after))
    })
}
