//! Google Gemini `generateContent` with function declarations.
//!
//! Gemini has no tool role: the model's function calls live in a `model`
//! turn and the results go back as `functionResponse` parts of a `user` turn.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::time::Duration;

use super::http::{build_client, header_value, post_json};
use super::{ChatProvider, Completion, ToolChoice};
use crate::error::{CalcError, Result};
use crate::models::{Conversation, Message, Role, ToolCallRequest};
use crate::tools::ToolDescriptor;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiProvider {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str, base_url: Option<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), header_value(PROVIDER, api_key)?);

        Ok(Self {
            client: build_client(PROVIDER, headers, timeout)?,
            // Accept both "gemini-2.5-flash" and "models/gemini-2.5-flash".
            model: model.trim_start_matches("models/").to_string(),
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub fn build_request(
        &self,
        conversation: &Conversation,
        tools: &[&ToolDescriptor],
        choice: ToolChoice,
    ) -> Value {
        let mut body = json!({ "contents": to_gemini_contents(conversation.messages()) });

        if let Some(instruction) = conversation.system_instruction() {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }

        if !tools.is_empty() {
            body["tools"] = json!([function_declarations(tools)]);
            body["toolConfig"] = json!({
                "functionCallingConfig": { "mode": calling_mode_name(choice) }
            });
        }

        body
    }

    pub async fn send_raw(&self, body: &Value) -> Result<Value> {
        post_json(&self.client, PROVIDER, &self.endpoint(), body).await
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
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

fn calling_mode_name(choice: ToolChoice) -> &'static str {
    match choice {
        ToolChoice::Auto => "AUTO",
        ToolChoice::Any => "ANY",
        ToolChoice::None => "NONE",
    }
}

/// The `tools[]` entry advertising `tools` to Gemini.
pub fn function_declarations(tools: &[&ToolDescriptor]) -> Value {
    let declarations: Vec<Value> = tools
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "parameters": to_gemini_schema(&t.parameters_schema()),
            })
        })
        .collect();
    json!({ "functionDeclarations": declarations })
}

/// Gemini's schema dialect: upper-case type names, no `additionalProperties`.
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                match (key.as_str(), value) {
                    ("additionalProperties", _) => continue,
                    ("type", Value::String(kind)) => {
                        out.insert(key.clone(), Value::String(kind.to_uppercase()));
                    }
                    ("properties", Value::Object(props)) => {
                        let props: Map<String, Value> = props
                            .iter()
                            .map(|(name, prop)| (name.clone(), to_gemini_schema(prop)))
                            .collect();
                        out.insert(key.clone(), Value::Object(props));
                    }
                    ("items", item) => {
                        out.insert(key.clone(), to_gemini_schema(item));
                    }
                    _ => {
                        out.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn to_gemini_contents(messages: &[Message]) -> Vec<Value> {
    let mut contents: Vec<Value> = Vec::new();
    let mut pending_responses: Vec<Value> = Vec::new();
    // Ids made up locally are never shown to the model.
    let local_ids: HashSet<&str> = messages
        .iter()
        .flat_map(|m| &m.tool_calls)
        .filter(|call| call.generated_id)
        .map(|call| call.id.as_str())
        .collect();

    for msg in messages {
        if msg.role != Role::Tool && !pending_responses.is_empty() {
            contents.push(json!({ "role": "user", "parts": std::mem::take(&mut pending_responses) }));
        }

        match msg.role {
            Role::System => {}
            Role::User => {
                contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": msg.content.clone().unwrap_or_default() }]
                }));
            }
            Role::Assistant => {
                let mut parts = Vec::new();
                if let Some(text) = msg.content.as_ref().filter(|t| !t.is_empty()) {
                    parts.push(json!({ "text": text }));
                }
                for call in &msg.tool_calls {
                    let mut function_call = Map::new();
                    if !call.generated_id {
                        function_call.insert("id".to_string(), json!(call.id));
                    }
                    function_call.insert("name".to_string(), json!(call.name));
                    function_call.insert("args".to_string(), call.arguments.clone());
                    let mut part = json!({ "functionCall": function_call });
                    if let Some(signature) = &call.signature {
                        part["thoughtSignature"] = json!(signature);
                    }
                    parts.push(part);
                }
                contents.push(json!({ "role": "model", "parts": parts }));
            }
            // All results of one turn travel together in a single user turn.
            Role::Tool => {
                if let Some(result) = &msg.tool_result {
                    let mut response = Map::new();
                    if !local_ids.contains(result.call_id.as_str()) {
                        response.insert("id".to_string(), json!(result.call_id));
                    }
                    response.insert("name".to_string(), json!(result.name));
                    response.insert("response".to_string(), json!({ "result": result.value }));
                    pending_responses.push(json!({ "functionResponse": response }));
                }
            }
        }
    }

    if !pending_responses.is_empty() {
        contents.push(json!({ "role": "user", "parts": pending_responses }));
    }

    contents
}

/// Turn a `generateContent` response into a [`Completion`].
pub fn parse_response(response_json: &Value) -> Result<Completion> {
    let candidate = match response_json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
    {
        Some(candidate) => candidate,
        None => {
            let reason = response_json
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str());
            return Err(match reason {
                Some(reason) => CalcError::provider(PROVIDER, format!("Prompt blocked: {}", reason)),
                None => CalcError::provider(PROVIDER, "No candidates in response"),
            });
        }
    };

    let parts = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = candidate
                .get("finishReason")
                .and_then(|r| r.as_str())
                .unwrap_or("UNKNOWN");
            CalcError::provider(PROVIDER, format!("Candidate has no content (finish reason {})", reason))
        })?;

    let mut text = String::new();
    let mut calls = Vec::new();
    for part in parts {
        if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
            text.push_str(t);
        }
        if let Some(call) = part.get("functionCall") {
            let signature = part
                .get("thoughtSignature")
                .and_then(|s| s.as_str())
                .map(str::to_string);
            calls.push(parse_function_call(call)?.with_signature(signature));
        }
    }

    let content = if text.is_empty() { None } else { Some(text) };

    if !calls.is_empty() {
        return Ok(Completion::ToolCalls { content, calls });
    }

    content
        .map(Completion::Text)
        .ok_or_else(|| CalcError::provider(PROVIDER, "Response contained neither text nor function calls"))
}

fn parse_function_call(call: &Value) -> Result<ToolCallRequest> {
    let name = call
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| CalcError::provider(PROVIDER, "functionCall missing 'name' field"))?;
    let args = call.get("args").cloned().unwrap_or_else(|| json!({}));

    Ok(match call.get("id").and_then(|i| i.as_str()) {
        Some(id) if !id.is_empty() => ToolCallRequest::new(id, name, args),
        _ => ToolCallRequest::with_generated_id(name, args),
    })
}

fn normalize_base_url(base_url: Option<String>) -> String {
    let base = base_url
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string());

    // A pasted ".../models/<model>:generateContent" URL keeps only its base.
    let trimmed = base.trim_end_matches('/');
    match trimmed.find("/models/") {
        Some(idx) if trimmed.ends_with(":generateContent") => trimmed[..idx].to_string(),
        _ => trimmed.to_string(),
    }
}
