use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{provider} error{}: {message}", status_suffix(.status))]
    Provider {
        provider: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Result of {tool} does not fit in a 64-bit integer: {detail}")]
    Overflow { tool: String, detail: String },

    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Model kept requesting tools after {0} rounds")]
    ToolRoundsExceeded(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CalcError {
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        CalcError::Provider {
            provider,
            status: None,
            message: message.into(),
        }
    }

    pub fn invalid_arguments(tool: &str, reason: impl Into<String>) -> Self {
        CalcError::InvalidArguments {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<anyhow::Error> for CalcError {
    fn from(err: anyhow::Error) -> Self {
        CalcError::Config(format!("{:#}", err))
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" (status {})", code))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, CalcError>;
