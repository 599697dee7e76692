pub mod gemini;
mod http;
pub mod mistral;

pub use gemini::{function_declarations, to_gemini_schema, GeminiProvider};
pub use mistral::MistralProvider;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProviderSettings;
use crate::error::Result;
use crate::models::{Conversation, ToolCallRequest};
use crate::tools::ToolDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Mistral,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Mistral => "mistral",
        }
    }

    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GOOGLE_API_KEY",
            ProviderKind::Mistral => "MISTRAL_API_KEY",
        }
    }

    pub fn model_var(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_MODEL",
            ProviderKind::Mistral => "MISTRAL_MODEL",
        }
    }

    pub fn endpoint_var(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_ENDPOINT",
            ProviderKind::Mistral => "MISTRAL_API_ENDPOINT",
        }
    }
}

/// How strongly the model is pushed towards calling a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    Any,
    None,
}

/// One model turn: either a final answer or tools to run first.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Text(String),
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    fn model_id(&self) -> &str;

    async fn complete(
        &self,
        conversation: &Conversation,
        tools: &[&ToolDescriptor],
        choice: ToolChoice,
    ) -> Result<Completion>;
}

pub fn build_provider(settings: &ProviderSettings, timeout: Duration) -> Result<Arc<dyn ChatProvider>> {
    let provider: Arc<dyn ChatProvider> = match settings.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            &settings.api_key,
            &settings.model,
            settings.endpoint.clone(),
            timeout,
        )?),
        ProviderKind::Mistral => Arc::new(MistralProvider::new(
            &settings.api_key,
            &settings.model,
            settings.endpoint.clone(),
            timeout,
        )?),
    };

    Ok(provider)
}
