use colored::*;
use serde_json::Value;

use crate::models::{Conversation, Role};

/// Label for the answer that follows. Goes to stderr so stdout holds only answers.
pub fn display_provider_header(provider: &str, model: &str) {
    eprintln!("{}", format!("[{} · {}]", provider, model).dimmed());
}

/// Print every tool call of an exchange with its result.
pub fn display_tool_trace(conversation: &Conversation) {
    for message in conversation.messages() {
        match message.role {
            Role::Assistant => {
                for call in &message.tool_calls {
                    eprintln!(
                        "{}",
                        format!("Calling tool: {}({}) [{}]", call.name, call.arguments, call.id).cyan()
                    );
                }
            }
            Role::Tool => {
                if let Some(result) = &message.tool_result {
                    eprintln!(
                        "{}",
                        format!("TOOL: {} -> {} [{}]", result.name, result.value, result.call_id).green()
                    );
                }
            }
            _ => {}
        }
    }
}

pub fn display_answer(answer: &str) {
    println!("{}", answer.trim_end());
}

pub fn print_tool_schemas(schemas: &Value) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(schemas)?);
    Ok(())
}
