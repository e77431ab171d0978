//! End-to-end interpretation of raw model replies.

use creator_compass::analysis::{
    ExtractionTier, ResponseInterpreter, ScriptContext, ScriptSanitizer,
};
use creator_compass::config::OutreachSettings;

const FENCED_WITH_DEFECTS: &str = r#"Sure! Here is the analysis you asked for:

```json
{
  "content_style": "hands-on reviews",
  "tone": "candid",
  "target_audience": "budget gamers",
  "main_topics": ["mechanical keyboards", "switch testing",],
  "pain_points": ["overpriced gear"],
  "golden_sentences": ["If it clacks, it should also last."],
  "optimal_outreach_script": "Hi [creator name], I watched your video and loved it.",
}
```

Let me know if you need anything else."#;

fn assert_script_invariants(script: &str, settings: &OutreachSettings) {
    assert!(!script.trim().is_empty());
    assert!(script.contains(&settings.sender_identity), "identity missing: {script}");
    let lowered = script.to_lowercase();
    for fragment in &settings.denylist {
        assert!(
            !lowered.contains(&fragment.to_lowercase()),
            "fragment {fragment:?} leaked into: {script}"
        );
    }
}

#[test]
fn fenced_reply_with_trailing_commas_is_structured() {
    let settings = OutreachSettings::default();
    let record = ResponseInterpreter::new(&settings).interpret(FENCED_WITH_DEFECTS, Some("Ava"));

    assert_eq!(record.tier, ExtractionTier::Structured);
    assert_eq!(record.main_topics, vec!["mechanical keyboards", "switch testing"]);
    assert_eq!(record.golden_quotes, vec!["If it clacks, it should also last."]);

    let script = &record.optimal_outreach_script;
    assert_script_invariants(script, &settings);
    assert!(script.starts_with("Hi Ava,"));
    assert!(script.contains("overpriced gear"));
    assert!(script.contains("mechanical keyboards"));
    assert!(script.contains("(trust hook, empathy anchor, value map)"));
}

#[test]
fn truncated_reply_recovers_fields() {
    let settings = OutreachSettings::default();
    let raw = r#"Analysis: {"content_style": "unboxing", "target_audience": "gamers on a budget",
        "pain_points": ["overpriced gear", "fake reviews"], "optimal_outreach_script": "Hi"#;
    let record = ResponseInterpreter::new(&settings).interpret(raw, None);

    assert_eq!(record.tier, ExtractionTier::Fallback);
    assert_eq!(record.content_style, "unboxing");
    assert_eq!(record.pain_points, vec!["overpriced gear", "fake reviews"]);
    assert_script_invariants(&record.optimal_outreach_script, &settings);
    assert!(record.optimal_outreach_script.starts_with("Hi there,"));
    assert!(record.optimal_outreach_script.contains("overpriced gear"));
}

#[test]
fn unusable_reply_yields_complete_placeholder() {
    let settings = OutreachSettings::default();
    let raw = r#"I could only work out "tone": "dry" and "content_style": "essays"."#;
    let record = ResponseInterpreter::new(&settings).interpret(raw, Some("Kai"));

    assert_eq!(record.tier, ExtractionTier::Default);
    assert_eq!(record.meaningful_topics().count(), 0);
    assert_script_invariants(&record.optimal_outreach_script, &settings);
    assert!(record.optimal_outreach_script.starts_with("Hi Kai,"));
}

#[test]
fn interpreted_script_is_stable_under_resanitizing() {
    let settings = OutreachSettings::default();
    let record = ResponseInterpreter::new(&settings).interpret(FENCED_WITH_DEFECTS, Some("Ava"));

    let sanitizer = ScriptSanitizer::new(&settings);
    let again = sanitizer.sanitize(
        &record.optimal_outreach_script,
        &ScriptContext::from_record(&record, Some("Ava")),
    );
    assert_eq!(again, record.optimal_outreach_script);
}

#[test]
fn custom_identity_and_terms_are_enforced() {
    let settings = OutreachSettings {
        sender_identity: "Northwind Studio".to_string(),
        methodology_terms: [
            "credibility".to_string(),
            "shared struggle".to_string(),
            "payoff".to_string(),
        ],
        denylist: vec!["[name]".to_string()],
    };
    let raw = r#"{"main_topics": ["sourdough"], "optimal_outreach_script": "Hello [name]! Loved the bread."}"#;
    let record = ResponseInterpreter::new(&settings).interpret(raw, Some("Zoe"));

    let script = &record.optimal_outreach_script;
    assert_script_invariants(script, &settings);
    assert!(script.contains("Zoe"));
    assert!(script.contains("sourdough"));
    assert!(script.contains("(credibility, shared struggle, payoff)"));
}
