//! Prompt templates for Creator Compass.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Literal fragments of the example script shown to the model.
///
/// Models tend to copy these verbatim, so the default outreach denylist is built
/// from them. Keep in sync with `ANALYSIS_USER`'s example output.
pub const EXAMPLE_SCRIPT_FRAGMENTS: &[&str] = &[
    "[creator name]",
    "[specific topic]",
    "[specific pain point]",
    "[golden quote]",
    "your recent video about [",
    "I watched your video and loved it",
    "{{",
    "}}",
];

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Prompts for single-video content analysis.
    pub analysis: AnalysisPrompts,
    /// Prompts for the comprehensive creator analysis across videos and notes.
    pub creator: CreatorPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for single-video content analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPrompts {
    pub system: String,
    pub user: String,
}

const ANALYSIS_SYSTEM: &str = r#"You are a professional content analyst. You study a creator's videos to understand their style, audience and the problems they solve, then help draft a respectful, specific first outreach message.

Always answer with a single JSON object and nothing else."#;

const ANALYSIS_USER: &str = r#"Analyze the following video transcript.

Title: {{title}}
Creator: {{author}}
Sender identity: {{sender}}

Transcript:
{{transcript}}

Return one JSON object with these keys:
- "content_style": short description of the content style
- "tone": the creator's tone of voice
- "target_audience": who the content is for
- "unique_approach": what sets this creator apart
- "main_topics": list of the main topics, most prominent first
- "pain_points": list of audience pain points the content addresses, most pressing first
- "value_propositions": list of the value the creator offers
- "core_values": list of values the creator stands for
- "golden_quotes": list of memorable sentences quoted verbatim from the transcript
- "blogger_characteristics": object with "expertise", "style", "personality", "experience_level"
- "core_insight": one paragraph explaining what makes this creator's content work
- "methodology_mapping": object with "trust_hook", "empathy_anchor", "value_map"
- "optimal_outreach_script": a first message from {{sender}} to the creator. It must mention {{sender}} by name, quote or reference something concrete from the video, and name the {{methodology}} ideas.

Example of the expected shape (do NOT copy its wording):
{
  "tone": "playful",
  "main_topics": ["[specific topic]"],
  "optimal_outreach_script": "Hi [creator name], I watched your video and loved it. Your recent video about [specific topic] and the line \"[golden quote]\" show how you handle [specific pain point]..."
}"#;

impl Default for AnalysisPrompts {
    fn default() -> Self {
        Self {
            system: ANALYSIS_SYSTEM.to_string(),
            user: ANALYSIS_USER.to_string(),
        }
    }
}

/// Prompts for the comprehensive creator analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatorPrompts {
    pub system: String,
    pub user: String,
}

const CREATOR_SYSTEM: &str = r#"You are a senior outreach strategist. You combine a creator's profile notes with transcripts of several of their videos into one consolidated analysis and a single best first-contact message.

Always answer with a single JSON object and nothing else."#;

const CREATOR_USER: &str = r#"Creator: {{creator}}
Sender identity: {{sender}}

Profile notes and video transcripts:
{{material}}

Return one JSON object with the same keys as a single-video analysis ("content_style", "tone", "target_audience", "unique_approach", "main_topics", "pain_points", "value_propositions", "core_values", "golden_quotes", "blogger_characteristics", "core_insight", "methodology_mapping", "optimal_outreach_script"), consolidated across all of the material.

The "core_insight" must be one narrative paragraph. The "methodology_mapping" must explain the creator's {{methodology}}. The "optimal_outreach_script" is written by {{sender}}, addresses {{creator}} by name, and must reference a concrete quote, topic or pain point from the material. Never use placeholder text in square brackets."#;

impl Default for CreatorPrompts {
    fn default() -> Self {
        Self {
            system: CREATOR_SYSTEM.to_string(),
            user: CREATOR_USER.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, applying overrides from a custom directory when present.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let analysis_path = custom_path.join("analysis.toml");
            if analysis_path.exists() {
                let content = std::fs::read_to_string(&analysis_path)?;
                prompts.analysis = toml::from_str(&content)?;
            }

            let creator_path = custom_path.join("creator.toml");
            if creator_path.exists() {
                let content = std::fs::read_to_string(&creator_path)?;
                prompts.creator = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.analysis.system.is_empty());
        assert!(prompts.creator.user.contains("{{creator}}"));
    }

    #[test]
    fn test_example_fragments_come_from_prompt() {
        for fragment in EXAMPLE_SCRIPT_FRAGMENTS {
            assert!(
                ANALYSIS_USER.contains(fragment),
                "fragment {:?} missing from the analysis prompt",
                fragment
            );
        }
    }

    #[test]
    fn test_render_with_custom_prefers_call_variables() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("sender".to_string(), "Config".to_string());
        prompts.variables.insert("team".to_string(), "Growth".to_string());

        let mut vars = HashMap::new();
        vars.insert("sender".to_string(), "Call".to_string());

        let result = prompts.render_with_custom("{{sender}} from {{team}}", &vars);
        assert_eq!(result, "Call from Growth");
    }

    #[test]
    fn test_load_custom_analysis_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("analysis.toml"),
            "system = \"custom system\"\nuser = \"custom {{title}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.analysis.system, "custom system");
        assert!(!prompts.creator.system.is_empty());
    }
}
