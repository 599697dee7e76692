use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::collections::HashMap;

use super::operations::{Operation, ToolDescriptor};
use crate::error::{CalcError, Result};

pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub operation: Operation,
}

/// Name-indexed set of callable operations. Built once, then only read.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The add/subtract/multiply registry every provider is given.
    pub fn arithmetic() -> Result<Self> {
        let mut registry = Self::new();
        for operation in Operation::ALL {
            registry.register(operation.descriptor(), operation)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: ToolDescriptor, operation: Operation) -> Result<()> {
        if self.tools.contains_key(&descriptor.name) {
            return Err(CalcError::DuplicateTool(descriptor.name));
        }

        tracing::debug!(tool = %descriptor.name, "registering tool");
        self.order.push(descriptor.name.clone());
        self.tools.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor,
                operation,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<Operation> {
        self.tools
            .get(name)
            .map(|tool| tool.operation)
            .ok_or_else(|| CalcError::UnknownTool(name.to_string()))
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| &tool.descriptor)
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn validate_arguments(&self, tool_name: &str, arguments: &Value) -> Result<()> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| CalcError::UnknownTool(tool_name.to_string()))?;

        let schema_value = tool.descriptor.validation_schema();
        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_value)
            .map_err(|e| CalcError::Config(format!("Invalid schema for tool '{}': {}", tool_name, e)))?;

        if let Err(errors) = schema.validate(arguments) {
            let error_messages: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect();
            return Err(CalcError::invalid_arguments(tool_name, error_messages.join("; ")));
        }

        Ok(())
    }
}
