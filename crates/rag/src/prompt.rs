//! Prompt construction for the completion call.
//!
//! The exchange is always two messages: the system instructions, then a
//! user message carrying the context, the history excerpt and the question.

use avocado_config::{AppConfig, Profile};
use avocado_core::message::Message;
use avocado_core::provider::ProviderRequest;

use crate::instructions;

/// Everything the completion model sees for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub system_instructions: String,
    pub context: String,
    pub history_excerpt: String,
    pub question: String,
}

impl PromptRequest {
    /// The user-role message body.
    pub fn user_message(&self) -> String {
        format!(
            "\nContext from vector database:\n----------------------------\n{}\n\n\
             Chat History (last 3):\n----------------------------\n{}\n\n\
             User Question:\n{}\n\n\
             Answer as per instructions above.\n",
            self.context, self.history_excerpt, self.question
        )
    }

    /// System message followed by the user message.
    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message::system(self.system_instructions.as_str()),
            Message::user(self.user_message()),
        ]
    }
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: "mistral-ai/Mistral-Nemo".into(),
            temperature: 0.3,
            max_tokens: 1024,
            top_p: 1.0,
        }
    }
}

impl GenerationParams {
    pub fn for_profile(config: &AppConfig, profile: Profile) -> Self {
        Self {
            model: config.completion.model.clone(),
            temperature: config.profile(profile).temperature,
            max_tokens: config.completion.max_tokens,
            top_p: config.completion.top_p,
        }
    }
}

/// Composes prompts with fixed instructions and generation parameters.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_instructions: String,
    params: GenerationParams,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(instructions::LARGE_CORPUS_INSTRUCTIONS, GenerationParams::default())
    }
}

impl PromptBuilder {
    pub fn new(system_instructions: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            system_instructions: system_instructions.into(),
            params,
        }
    }

    /// Profile instructions (or the configured override) and parameters.
    pub fn for_profile(config: &AppConfig, profile: Profile) -> Self {
        let system_instructions = config
            .profile(profile)
            .system_prompt
            .clone()
            .unwrap_or_else(|| instructions::default_instructions(profile).to_string());
        Self::new(system_instructions, GenerationParams::for_profile(config, profile))
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn build(&self, context: &str, history_excerpt: &str, question: &str) -> PromptRequest {
        PromptRequest {
            system_instructions: self.system_instructions.clone(),
            context: context.to_string(),
            history_excerpt: history_excerpt.to_string(),
            question: question.to_string(),
        }
    }

    pub fn to_provider_request(&self, prompt: &PromptRequest) -> ProviderRequest {
        ProviderRequest {
            model: self.params.model.clone(),
            messages: prompt.messages(),
            temperature: self.params.temperature,
            max_tokens: Some(self.params.max_tokens),
            top_p: Some(self.params.top_p),
            stop: Vec::new(),
        }
    }
}
