pub mod defaults;
mod provider;
mod validation;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Args;
use crate::dispatch::{CallingMode, DispatchOptions};
use crate::error::{CalcError, Result};
use crate::providers::{ProviderKind, ToolChoice};

pub use provider::{ProviderFileConfig, ProviderSettings};
pub use validation::{expand_env_var_in_string, parse_flag, require_api_key};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tool_rounds: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
}

/// Contents of `.calcbot.yaml` (or `.json`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub gemini: ProviderFileConfig,
    #[serde(default)]
    pub mistral: ProviderFileConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Everything a run needs, validated before any network call.
#[derive(Debug, Clone)]
pub struct Config {
    pub providers: Vec<ProviderSettings>,
    pub system_instruction: Option<String>,
    pub max_tool_rounds: usize,
    pub request_timeout: u64,
    pub verbose: bool,
}

impl Config {
    pub fn from_env_and_args(args: &Args, file: &FileConfig) -> Result<Self> {
        Self::resolve(args, file, &|key: &str| env::var(key).ok())
    }

    pub fn resolve(
        args: &Args,
        file: &FileConfig,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let providers = args
            .provider
            .kinds()
            .into_iter()
            .map(|kind| ProviderSettings::resolve(kind, args, file.provider(kind), lookup))
            .collect::<Result<Vec<_>>>()?;

        // An explicitly empty instruction disables it.
        let system_instruction = lookup("CALCBOT_SYSTEM_INSTRUCTION")
            .or_else(|| {
                file.session
                    .system_instruction
                    .as_deref()
                    .map(|s| expand_env_var_in_string(s, lookup))
            })
            .unwrap_or_else(|| defaults::DEFAULT_SYSTEM_INSTRUCTION.to_string());
        let system_instruction = Some(system_instruction).filter(|s| !s.trim().is_empty());

        let max_tool_rounds = match args.max_tool_rounds {
            Some(rounds) => rounds,
            None => match lookup("CALCBOT_MAX_TOOL_ROUNDS") {
                Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                    CalcError::Config(format!("CALCBOT_MAX_TOOL_ROUNDS must be a number, got '{}'", raw))
                })?,
                None => file
                    .session
                    .max_tool_rounds
                    .unwrap_or_else(defaults::default_max_tool_rounds),
            },
        };

        let request_timeout = match lookup("CALCBOT_REQUEST_TIMEOUT") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                CalcError::Config(format!("CALCBOT_REQUEST_TIMEOUT must be a number of seconds, got '{}'", raw))
            })?,
            None => file
                .session
                .request_timeout
                .unwrap_or_else(defaults::default_request_timeout),
        };
        if request_timeout == 0 {
            return Err(CalcError::Config("request timeout must be at least 1 second".to_string()));
        }

        Ok(Config {
            providers,
            system_instruction,
            max_tool_rounds,
            request_timeout,
            verbose: Self::resolve_verbose(args, file, lookup),
        })
    }

    /// CLI flag > env var > config file > off.
    pub fn resolve_verbose(args: &Args, file: &FileConfig, lookup: &impl Fn(&str) -> Option<String>) -> bool {
        args.verbose
            || lookup("CALCBOT_VERBOSE")
                .and_then(|v| parse_flag(&v))
                .or(file.session.verbose)
                .unwrap_or(false)
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.kind == kind)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn dispatch_options(&self, settings: &ProviderSettings) -> DispatchOptions {
        DispatchOptions {
            mode: settings.calling_mode,
            tool_choice: settings.tool_choice,
            max_tool_rounds: self.max_tool_rounds,
            system_instruction: self.system_instruction.clone(),
        }
    }
}

impl FileConfig {
    pub fn provider(&self, kind: ProviderKind) -> &ProviderFileConfig {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Mistral => &self.mistral,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_paths())
    }

    /// First existing path wins. No file at all means defaults.
    pub fn load_from(paths: &[PathBuf]) -> Result<Self> {
        for path in paths {
            if path.exists() {
                return Ok(Self::read(path)?);
            }
        }

        Ok(FileConfig::default())
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );

        let config: FileConfig = if is_yaml {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))?
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config file: {}", path.display()))?
        };

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".calcbot.yaml"),
            PathBuf::from(".calcbot.yml"),
            PathBuf::from(".calcbot.json"),
        ];

        if let Some(config_dir) = Self::global_config_dir() {
            paths.push(config_dir.join("calcbot.yaml"));
            paths.push(config_dir.join("calcbot.yml"));
            paths.push(config_dir.join("calcbot.json"));
        }

        paths
    }

    fn global_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("calcbot"))
    }

    /// The file `--config-init` writes, with every default spelled out.
    pub fn example() -> Self {
        let section = |kind: ProviderKind| ProviderFileConfig {
            model: Some(defaults::default_model(kind).to_string()),
            endpoint: None,
            calling_mode: Some(defaults::default_calling_mode(kind)),
            tool_choice: Some(defaults::default_tool_choice(kind)),
        };

        FileConfig {
            gemini: section(ProviderKind::Gemini),
            mistral: section(ProviderKind::Mistral),
            session: SessionConfig {
                verbose: Some(false),
                system_instruction: Some(defaults::DEFAULT_SYSTEM_INSTRUCTION.to_string()),
                max_tool_rounds: Some(defaults::default_max_tool_rounds()),
                request_timeout: Some(defaults::default_request_timeout()),
            },
        }
    }

    /// Writes [`FileConfig::example`] to `path` (or the global config location), refusing to overwrite.
    pub fn write_example(path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::global_config_dir()
                .map(|dir| dir.join("calcbot.yaml"))
                .ok_or_else(|| CalcError::Config("Could not determine home directory".to_string()))?,
        };

        if path.exists() {
            return Err(CalcError::Config(format!(
                "Config file already exists: {}",
                path.display()
            )));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_yaml::to_string(&Self::example())?)?;
        Ok(path)
    }
}

/// One-line summary of a provider's effective settings.
pub fn describe(settings: &ProviderSettings) -> String {
    let mode = match settings.calling_mode {
        CallingMode::Automatic => "automatic",
        CallingMode::Manual => "manual",
    };
    let choice = match settings.tool_choice {
        ToolChoice::Auto => "auto",
        ToolChoice::Any => "any",
        ToolChoice::None => "none",
    };
    format!("{} ({}, {} mode, tool choice {})", settings.kind.name(), settings.model, mode, choice)
}
