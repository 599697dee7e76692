use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

use crate::error::{CalcError, Result};

pub(crate) fn build_client(
    provider: &'static str,
    mut headers: HeaderMap,
    timeout: Duration,
) -> Result<reqwest::Client> {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| CalcError::provider(provider, format!("failed to build HTTP client: {}", e)))
}

pub(crate) fn header_value(provider: &'static str, value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|e| CalcError::Config(format!("Invalid {} API key: {}", provider, e)))?;
    header.set_sensitive(true);
    Ok(header)
}

/// POST a JSON body and return the parsed JSON response. Non-2xx is an error.
pub(crate) async fn post_json(
    client: &reqwest::Client,
    provider: &'static str,
    url: &str,
    body: &Value,
) -> Result<Value> {
    tracing::debug!(provider, url, "sending request");
    tracing::trace!(provider, body = %body, "request body");

    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| network_error(provider, e))?;

    let status = response.status();
    let text = response.text().await.map_err(|e| network_error(provider, e))?;
    tracing::debug!(provider, status = status.as_u16(), "response received");
    tracing::trace!(provider, body = %text, "response body");

    if !status.is_success() {
        return Err(CalcError::Provider {
            provider,
            status: Some(status.as_u16()),
            message: error_message(&text),
        });
    }

    serde_json::from_str(&text)
        .map_err(|e| CalcError::provider(provider, format!("invalid JSON in response: {}", e)))
}

fn network_error(provider: &'static str, err: reqwest::Error) -> CalcError {
    if err.is_timeout() {
        CalcError::provider(provider, "request timed out")
    } else {
        CalcError::provider(provider, format!("network error: {}", err))
    }
}

// Gemini nests the message under `error`; Mistral uses `message` or `detail`.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|json| {
        json.pointer("/error/message")
            .or_else(|| json.get("message"))
            .or_else(|| json.get("detail"))
            .map(|m| match m {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    });

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => "Unknown error".to_string(),
        None => body.trim().to_string(),
    }
}
