use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::http::{build_client, header_value, post_json};
use super::{ChatProvider, Completion, ToolChoice};
use crate::error::{CalcError, Result};
use crate::models::{Conversation, Message, Role, ToolCallRequest};
use crate::tools::ToolDescriptor;

pub const DEFAULT_MISTRAL_ENDPOINT: &str = "https://api.mistral.ai/v1";

const PROVIDER: &str = "mistral";

/// Mistral chat completions, OpenAI-style tool calling.
pub struct MistralProvider {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl MistralProvider {
    pub fn new(api_key: &str, model: &str, base_url: Option<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(PROVIDER, &format!("Bearer {}", api_key))?);

        Ok(Self {
            client: build_client(PROVIDER, headers, timeout)?,
            model: model.to_string(),
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn build_request(
        &self,
        conversation: &Conversation,
        tools: &[&ToolDescriptor],
        choice: ToolChoice,
    ) -> Value {
        let messages: Vec<Value> = conversation.messages().iter().map(to_mistral_message).collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });

        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(|t| t.to_function_tool()).collect());
            body["tool_choice"] = json!(tool_choice_name(choice));
        }

        body
    }

    pub async fn send_raw(&self, body: &Value) -> Result<Value> {
        post_json(&self.client, PROVIDER, &self.endpoint(), body).await
    }
}

#[async_trait]
impl ChatProvider for MistralProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        conversation: &Conversation,
        tools: &[&ToolDescriptor],
        choice: ToolChoice,
    ) -> Result<Completion> {
        let body = self.build_request(conversation, tools, choice);
        let response = self.send_raw(&body).await?;
        parse_response(&response)
    }
}

fn tool_choice_name(choice: ToolChoice) -> &'static str {
    match choice {
        ToolChoice::Auto => "auto",
        ToolChoice::Any => "any",
        ToolChoice::None => "none",
    }
}

fn to_mistral_message(msg: &Message) -> Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let mut out = Map::new();
    out.insert("role".to_string(), json!(role));
    out.insert(
        "content".to_string(),
        msg.content.clone().map(Value::String).unwrap_or(Value::Null),
    );

    if !msg.tool_calls.is_empty() {
        let calls: Vec<Value> = msg
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": arguments_string(&call.arguments),
                    }
                })
            })
            .collect();
        out.insert("tool_calls".to_string(), Value::Array(calls));
    }

    if let Some(result) = &msg.tool_result {
        out.insert("name".to_string(), json!(result.name));
        out.insert("tool_call_id".to_string(), json!(result.call_id));
    }

    Value::Object(out)
}

fn arguments_string(arguments: &Value) -> String {
    match arguments {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

/// Turn a chat completions response into a [`Completion`].
pub fn parse_response(response_json: &Value) -> Result<Completion> {
    let message = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .ok_or_else(|| CalcError::provider(PROVIDER, "No message in response"))?;

    let content = extract_content(message);

    let calls: Vec<ToolCallRequest> = message
        .get("tool_calls")
        .and_then(|tc| tc.as_array())
        .map(|calls| calls.iter().map(parse_tool_call).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    if !calls.is_empty() {
        return Ok(Completion::ToolCalls { content, calls });
    }

    content
        .map(Completion::Text)
        .ok_or_else(|| CalcError::provider(PROVIDER, "Response contained neither text nor tool calls"))
}

fn parse_tool_call(tool_call: &Value) -> Result<ToolCallRequest> {
    let function = tool_call
        .get("function")
        .ok_or_else(|| CalcError::provider(PROVIDER, "Tool call missing 'function' field"))?;

    let name = function
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| CalcError::provider(PROVIDER, "Tool call missing 'function.name' field"))?;

    // Arguments normally arrive as a JSON string. Unparseable text is kept
    // as a string so argument validation rejects it after lookup.
    let arguments = match function.get("arguments") {
        Some(Value::String(raw)) => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
        }
        Some(other) => other.clone(),
        None => json!({}),
    };

    Ok(match tool_call.get("id").and_then(|i| i.as_str()) {
        Some(id) if !id.is_empty() => ToolCallRequest::new(id, name, arguments),
        _ => ToolCallRequest::with_generated_id(name, arguments),
    })
}

fn extract_content(message: &Value) -> Option<String> {
    match message.get("content") {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        Some(Value::Array(chunks)) => {
            let text: String = chunks
                .iter()
                .filter_map(|chunk| chunk.get("text").and_then(|t| t.as_str()))
                .collect();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        }
        _ => None,
    }
}

fn normalize_base_url(base_url: Option<String>) -> String {
    let base = base_url
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| DEFAULT_MISTRAL_ENDPOINT.to_string());

    // Users sometimes paste the full endpoint.
    let trimmed = base.trim_end_matches('/');
    trimmed
        .strip_suffix("/chat/completions")
        .unwrap_or(trimmed)
        .to_string()
}
