use crate::dispatch::CallingMode;
use crate::providers::{ProviderKind, ToolChoice};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful calculator bot. You can add, subtract, and multiply numbers. Do not perform any other task.";

pub fn default_model(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "gemini-2.5-flash",
        ProviderKind::Mistral => "mistral-large-latest",
    }
}

pub fn default_calling_mode(kind: ProviderKind) -> CallingMode {
    match kind {
        ProviderKind::Gemini => CallingMode::Automatic,
        ProviderKind::Mistral => CallingMode::Manual,
    }
}

pub fn default_tool_choice(kind: ProviderKind) -> ToolChoice {
    match kind {
        ProviderKind::Gemini => ToolChoice::Auto,
        ProviderKind::Mistral => ToolChoice::Any,
    }
}

/// Prompt used for a provider when none is given on the command line.
pub fn demo_prompt(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "what is 5 - 7",
        ProviderKind::Mistral => "what is 5 * 7",
    }
}

pub fn default_max_tool_rounds() -> usize {
    10
}

pub fn default_request_timeout() -> u64 {
    60
}
