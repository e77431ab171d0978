//! Content analysis: turning raw model output into a complete [`AnalysisRecord`].
//!
//! Model output is treated as untrusted text. Interpretation runs in tiers:
//!
//! 1. [`ResponseParser`] looks for a JSON object and repairs common defects.
//! 2. [`FallbackExtractor`] mines individual fields when no object parses.
//! 3. [`AnalysisRecord::placeholder`] is substituted when both fail.
//!
//! The outreach script of the resulting record is then passed through the
//! [`ScriptSanitizer`]. None of these steps fail; every call yields a record.

mod analyzer;
pub mod fallback;
pub mod parser;
pub mod record;
pub mod sanitizer;

pub use analyzer::{ChatModel, ContentAnalyzer, ContentRequest, OpenAiChat};
pub use fallback::{FallbackError, FallbackExtractor, MIN_MEANINGFUL_FIELDS};
pub use parser::{JsonRepair, ParseError, RegexRepair, ResponseParser};
pub use record::{is_sentinel, AnalysisRecord, Characteristics, ExtractionTier, MethodologyMapping};
pub use sanitizer::{SanitizeError, ScriptContext, ScriptSanitizer};

use crate::config::OutreachSettings;
use tracing::{debug, info, warn};

/// The full raw-text-to-record pipeline.
pub struct ResponseInterpreter<R: JsonRepair = RegexRepair> {
    parser: ResponseParser<R>,
    fallback: FallbackExtractor,
    sanitizer: ScriptSanitizer,
}

impl ResponseInterpreter<RegexRepair> {
    pub fn new(outreach: &OutreachSettings) -> Self {
        Self::with_parser(ResponseParser::new(), outreach)
    }
}

impl<R: JsonRepair> ResponseInterpreter<R> {
    pub fn with_parser(parser: ResponseParser<R>, outreach: &OutreachSettings) -> Self {
        Self {
            parser,
            fallback: FallbackExtractor::new(),
            sanitizer: ScriptSanitizer::new(outreach),
        }
    }

    /// Interpret `raw` model output. `addressee` is the creator's display name, if known.
    pub fn interpret(&self, raw: &str, addressee: Option<&str>) -> AnalysisRecord {
        let record = self.extract(raw);
        let script = self.sanitizer.sanitize(
            &record.optimal_outreach_script,
            &ScriptContext::from_record(&record, addressee),
        );
        record.with_outreach_script(script)
    }

    /// Run the extraction tiers without sanitizing.
    pub fn extract(&self, raw: &str) -> AnalysisRecord {
        let parse_error = match self.parser.parse(raw) {
            Ok(map) => {
                debug!("Parsed structured analysis with {} fields", map.len());
                return AnalysisRecord::from_map(&map, ExtractionTier::Structured);
            }
            Err(e) => e,
        };

        info!("Structured parse failed ({}), trying field recovery", parse_error);
        match self.fallback.extract(raw) {
            Ok(map) => AnalysisRecord::from_map(&map, ExtractionTier::Fallback),
            Err(e) => {
                warn!("Field recovery failed ({}), using placeholder analysis", e);
                AnalysisRecord::placeholder()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter() -> ResponseInterpreter {
        ResponseInterpreter::new(&OutreachSettings::default())
    }

    #[test]
    fn test_structured_tier() {
        let raw = r#"```json
{"tone": "playful", "main_topics": ["tech", "reviews"], "pain_points": ["too many specs"],
 "optimal_outreach_script": "Hi Mia, I'm LMW. Your tech reviews cut through too many specs. Your trust hook is honesty."}
```"#;
        let record = interpreter().interpret(raw, Some("Mia"));
        assert_eq!(record.tier, ExtractionTier::Structured);
        assert_eq!(record.tone, "playful");
        assert_eq!(
            record.optimal_outreach_script,
            "Hi Mia, I'm LMW. Your tech reviews cut through too many specs. Your trust hook is honesty."
        );
    }

    #[test]
    fn test_fallback_tier() {
        let raw = r#"{"content_style": "tutorials", "tone": "patient", "main_topics": ["knitting"] "broken"#;
        let record = interpreter().interpret(raw, None);
        assert_eq!(record.tier, ExtractionTier::Fallback);
        assert_eq!(record.content_style, "tutorials");
        assert_eq!(record.target_audience, record::UNKNOWN);
        assert!(record.optimal_outreach_script.contains("LMW"));
    }

    #[test]
    fn test_default_tier_is_complete() {
        let record = interpreter().interpret("The service is overloaded.", None);
        assert_eq!(record.tier, ExtractionTier::Default);
        assert_eq!(record.main_topics.len(), 1);
        assert!(record.optimal_outreach_script.contains("LMW"));
        assert!(record.optimal_outreach_script.contains("value map"));
    }
}
