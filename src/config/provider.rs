use serde::{Deserialize, Serialize};
use std::fmt;

use super::defaults;
use super::validation::{expand_env_var_in_string, require_api_key};
use crate::cli::Args;
use crate::dispatch::CallingMode;
use crate::error::Result;
use crate::providers::{ProviderKind, ToolChoice};

/// Per-provider section of the config file. Credentials never live here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderFileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calling_mode: Option<CallingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

#[derive(Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub endpoint: Option<String>,
    pub calling_mode: CallingMode,
    pub tool_choice: ToolChoice,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("calling_mode", &self.calling_mode)
            .field("tool_choice", &self.tool_choice)
            .finish()
    }
}

impl ProviderSettings {
    /// Precedence: CLI args > env var > config file > default. The API key comes from the env only.
    pub fn resolve(
        kind: ProviderKind,
        args: &Args,
        file: &ProviderFileConfig,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = require_api_key(kind, lookup(kind.api_key_var()))?;

        let model = lookup(kind.model_var())
            .or_else(|| file.model.as_deref().map(|m| expand_env_var_in_string(m, lookup)))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| defaults::default_model(kind).to_string());

        let endpoint = lookup(kind.endpoint_var())
            .or_else(|| file.endpoint.as_deref().map(|e| expand_env_var_in_string(e, lookup)))
            .filter(|e| !e.trim().is_empty());

        let calling_mode = args
            .mode
            .or(file.calling_mode)
            .unwrap_or_else(|| defaults::default_calling_mode(kind));

        let tool_choice = args
            .tool_choice
            .or(file.tool_choice)
            .unwrap_or_else(|| defaults::default_tool_choice(kind));

        Ok(Self {
            kind,
            api_key,
            model,
            endpoint,
            calling_mode,
            tool_choice,
        })
    }
}
