use clap::{Parser, ValueEnum};

use crate::dispatch::CallingMode;
use crate::providers::{ProviderKind, ToolChoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProviderSelection {
    Gemini,
    Mistral,
    #[default]
    Both,
}

impl ProviderSelection {
    pub fn kinds(&self) -> Vec<ProviderKind> {
        match self {
            ProviderSelection::Gemini => vec![ProviderKind::Gemini],
            ProviderSelection::Mistral => vec![ProviderKind::Mistral],
            ProviderSelection::Both => vec![ProviderKind::Gemini, ProviderKind::Mistral],
        }
    }
}

impl From<ProviderKind> for ProviderSelection {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Gemini => ProviderSelection::Gemini,
            ProviderKind::Mistral => ProviderSelection::Mistral,
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(name = "calcbot")]
#[command(about = "Let a hosted model pick add/subtract/multiply tools to answer arithmetic questions", long_about = None)]
pub struct Args {
    #[arg(
        short = 'p',
        long = "provider",
        value_enum,
        default_value_t = ProviderSelection::Both,
        help = "Which provider(s) to ask"
    )]
    pub provider: ProviderSelection,

    #[arg(
        short = 'm',
        long = "mode",
        value_enum,
        help = "Run requested tools until the model answers (automatic) or for one round only (manual)"
    )]
    pub mode: Option<CallingMode>,

    #[arg(
        long = "tool-choice",
        value_enum,
        help = "Tool choice for the first request (auto, any, none)"
    )]
    pub tool_choice: Option<ToolChoice>,

    #[arg(
        long = "max-tool-rounds",
        help = "Maximum tool rounds in automatic mode"
    )]
    pub max_tool_rounds: Option<usize>,

    #[arg(short = 'v', long = "verbose", help = "Show tool calls and debug logging")]
    pub verbose: bool,

    #[arg(long = "list-tools", help = "Print the tool schemas sent to the models and exit")]
    pub list_tools: bool,

    #[arg(long = "config-init", help = "Write an example config file and exit")]
    pub config_init: bool,

    #[arg(help = "Prompt to send; without one, each provider gets its demo prompt")]
    pub prompt: Vec<String>,
}

impl Args {
    pub fn prompt_text(&self) -> Option<String> {
        let prompt = self.prompt.join(" ");
        if prompt.trim().is_empty() {
            None
        } else {
            Some(prompt)
        }
    }
}
