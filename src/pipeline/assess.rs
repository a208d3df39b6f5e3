//! Suspicion assessment: build the fixed conversation and call the model.
//!
//! All prompt text lives in [`crate::prompts`]; this module only decides
//! the turn layout and forwards it to the provider. The reply comes back
//! verbatim. Whether it is valid JSON is decided later by
//! [`crate::verdict::Verdict::from_reply`].
//!
//! ## Message Layout
//!
//! 1. **System message**: the strict scam/phishing instruction (or override)
//! 2. **Assistant message**: one worked example of the reply shape
//! 3. **User message**: the submitted text, or the image as a PNG attachment
//!    with empty text

use crate::config::CheckerConfig;
use crate::error::SusCheckError;
use crate::pipeline::image::EncodedImage;
use crate::prompts::{DEFAULT_SYSTEM_PROMPT, EXAMPLE_REPLY};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// What the user submitted, in the form the model receives it.
#[derive(Debug, Clone, Copy)]
pub enum AssessmentInput<'a> {
    Text(&'a str),
    Image(&'a EncodedImage),
}

/// One turn of the assessment conversation.
#[derive(Debug, Clone, Copy)]
pub enum Turn<'a> {
    System(&'a str),
    Assistant(&'a str),
    UserText(&'a str),
    UserImage(&'a EncodedImage),
}

/// The three-turn conversation sent for every check.
pub fn conversation<'a>(system_prompt: &'a str, input: AssessmentInput<'a>) -> Vec<Turn<'a>> {
    let user = match input {
        AssessmentInput::Text(text) => Turn::UserText(text),
        AssessmentInput::Image(image) => Turn::UserImage(image),
    };
    vec![
        Turn::System(system_prompt),
        Turn::Assistant(EXAMPLE_REPLY),
        user,
    ]
}

/// Capability: "assess this content", returning the raw reply text.
///
/// Implemented by [`LlmAssessor`] for real completion APIs; tests substitute
/// fakes.
#[async_trait]
pub trait ContentAssessor: Send + Sync {
    async fn assess(&self, input: AssessmentInput<'_>) -> Result<String, SusCheckError>;
}

/// [`ContentAssessor`] backed by an `edgequake_llm` chat provider.
pub struct LlmAssessor {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    max_tokens: usize,
}

impl LlmAssessor {
    pub fn new(provider: Arc<dyn LLMProvider>, max_tokens: usize) -> Self {
        Self {
            provider,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Resolve the provider from `config` and apply its prompt/token settings.
    pub fn from_config(config: &CheckerConfig) -> Result<Self, SusCheckError> {
        let provider = resolve_provider(config)?;
        let assessor = Self::new(provider, config.max_tokens);
        Ok(match config.system_prompt {
            Some(ref prompt) => assessor.with_system_prompt(prompt.clone()),
            None => assessor,
        })
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ContentAssessor for LlmAssessor {
    async fn assess(&self, input: AssessmentInput<'_>) -> Result<String, SusCheckError> {
        let start = Instant::now();
        let messages = to_chat_messages(&conversation(&self.system_prompt, input));
        info!("Requesting suspicion assessment ({} messages)", messages.len());

        let response = self
            .provider
            .chat(&messages, Some(&self.options()))
            .await
            .map_err(|e| SusCheckError::LlmApiError {
                message: e.to_string(),
            })?;

        debug!(
            "Assessment: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Map local turns onto provider chat messages.
fn to_chat_messages(turns: &[Turn<'_>]) -> Vec<ChatMessage> {
    turns
        .iter()
        .map(|turn| match *turn {
            Turn::System(text) => ChatMessage::system(text),
            Turn::Assistant(text) => ChatMessage::assistant(text),
            Turn::UserText(text) => ChatMessage::user(text),
            Turn::UserImage(image) => ChatMessage::user_with_images(
                "",
                vec![ImageData::new(image.data.clone(), "image/png")],
            ),
        })
        .collect()
}

/// Resolve the LLM provider: a pre-built one wins, otherwise the named
/// provider (default "openai") is created with the configured model.
///
/// The factory reads the provider's API key (`OPENAI_API_KEY`, ...) from the
/// environment here, once per resolved provider.
pub fn resolve_provider(config: &CheckerConfig) -> Result<Arc<dyn LLMProvider>, SusCheckError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let name = config.provider_name_or_default();
    ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
        SusCheckError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!(
                "Set the API key for '{name}' (OPENAI_API_KEY for openai).\nError: {e}"
            ),
        }
    })
}
