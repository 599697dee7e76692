use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A function the model wants executed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
    /// Set when the provider sent no id and `id` was made up locally.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub generated_id: bool,
    /// Opaque provider token that must be echoed back with this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            generated_id: false,
            signature: None,
        }
    }

    /// For providers whose responses carry no call identifier.
    pub fn with_generated_id(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            generated_id: true,
            ..Self::new(format!("call_{}", uuid::Uuid::new_v4().simple()), name, arguments)
        }
    }

    pub fn with_signature(mut self, signature: Option<String>) -> Self {
        self.signature = signature;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub call_id: String,
    pub name: String,
    pub value: i64,
}
