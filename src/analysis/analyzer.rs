//! LLM invocation for content and creator analysis.

use super::{AnalysisRecord, ResponseInterpreter};
use crate::config::{LlmSettings, OutreachSettings, Prompts};
use crate::error::{CompassError, Result};
use crate::openai::create_chat_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A chat model that answers one system + user prompt pair with raw text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Chat completion against an OpenAI-compatible endpoint (OpenAI or DeepSeek).
pub struct OpenAiChat {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChat {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_chat_client(settings)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| CompassError::Analysis(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user.to_string())
                .build()
                .map_err(|e| CompassError::Analysis(e.to_string()))?
                .into(),
        ];

        #[allow(deprecated)]
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| CompassError::Analysis(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            CompassError::OpenAI(format!("Chat completion failed: {}", e))
        })?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| CompassError::Analysis("Empty response from LLM".to_string()))
    }
}

/// What the model is asked to analyze for a single video.
#[derive(Debug, Clone)]
pub struct ContentRequest<'a> {
    pub title: &'a str,
    pub author: Option<&'a str>,
    pub transcript: &'a str,
}

/// Runs analysis prompts through a [`ChatModel`] and interprets the replies.
pub struct ContentAnalyzer {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    interpreter: ResponseInterpreter,
    sender: String,
    methodology: String,
}

impl ContentAnalyzer {
    /// Build an analyzer backed by the configured LLM provider.
    pub fn from_settings(
        llm: &LlmSettings,
        outreach: &OutreachSettings,
        prompts: Prompts,
    ) -> Result<Self> {
        Ok(Self::new(Arc::new(OpenAiChat::new(llm)?), outreach, prompts))
    }

    pub fn new(model: Arc<dyn ChatModel>, outreach: &OutreachSettings, prompts: Prompts) -> Self {
        Self {
            model,
            prompts,
            interpreter: ResponseInterpreter::new(outreach),
            sender: outreach.sender_identity.clone(),
            methodology: outreach.methodology_terms.join(", "),
        }
    }

    /// Analyze one transcript.
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn analyze_content(&self, request: &ContentRequest<'_>) -> Result<AnalysisRecord> {
        info!("Analyzing content ({} chars)", request.transcript.chars().count());

        let mut vars = self.base_vars();
        vars.insert("title".to_string(), request.title.to_string());
        vars.insert(
            "author".to_string(),
            request.author.unwrap_or("unknown").to_string(),
        );
        vars.insert("transcript".to_string(), request.transcript.to_string());

        let user = self
            .prompts
            .render_with_custom(&self.prompts.analysis.user, &vars);
        let raw = self.model.complete(&self.prompts.analysis.system, &user).await?;
        debug!("Model replied with {} chars", raw.len());

        Ok(self.interpreter.interpret(&raw, request.author))
    }

    /// Produce the consolidated analysis of a creator from notes and transcripts.
    #[instrument(skip(self, material))]
    pub async fn analyze_creator(&self, creator: &str, material: &str) -> Result<AnalysisRecord> {
        info!("Analyzing creator material ({} chars)", material.chars().count());

        let mut vars = self.base_vars();
        vars.insert("creator".to_string(), creator.to_string());
        vars.insert("material".to_string(), material.to_string());

        let user = self
            .prompts
            .render_with_custom(&self.prompts.creator.user, &vars);
        let raw = self.model.complete(&self.prompts.creator.system, &user).await?;

        Ok(self.interpreter.interpret(&raw, Some(creator)))
    }

    fn base_vars(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("sender".to_string(), self.sender.clone());
        vars.insert("methodology".to_string(), self.methodology.clone());
        vars
    }
}
