use regex::Regex;

use crate::error::{CalcError, Result};
use crate::providers::ProviderKind;

/// Expand `${VAR_NAME}` references using `lookup`. Unknown variables are left as written.
pub fn expand_env_var_in_string(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let Ok(re) = Regex::new(r"\$\{([^}]+)\}") else {
        return value.to_string();
    };

    re.replace_all(value, |cap: &regex::Captures| {
        lookup(&cap[1]).unwrap_or_else(|| cap[0].to_string())
    })
    .into_owned()
}

pub fn require_api_key(kind: ProviderKind, value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(key) if !key.is_empty() => Ok(key),
        Some(_) => Err(CalcError::Config(format!(
            "{} is set but empty",
            kind.api_key_var()
        ))),
        None => Err(CalcError::Config(format!(
            "{} environment variable not set",
            kind.api_key_var()
        ))),
    }
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
