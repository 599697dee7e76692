use serde_json::{Map, Number, Value};

use super::operations::Operation;
use super::registry::ToolRegistry;
use crate::error::{CalcError, Result};
use crate::models::{ToolCallRequest, ToolCallResult};

/// Operands widened to `i128` so any JSON integer (`i64` or `u64`) is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operands {
    pub a: i128,
    pub b: i128,
}

/// A tool call that passed lookup and argument validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub call_id: String,
    pub name: String,
    pub operation: Operation,
    pub operands: Operands,
}

impl Invocation {
    pub fn evaluate(&self) -> Result<ToolCallResult> {
        let Operands { a, b } = self.operands;
        let value = self
            .operation
            .apply(a, b)
            .and_then(|v| i64::try_from(v).ok())
            .ok_or_else(|| CalcError::Overflow {
                tool: self.name.clone(),
                detail: format!("{}({}, {})", self.name, a, b),
            })?;

        Ok(ToolCallResult {
            call_id: self.call_id.clone(),
            name: self.name.clone(),
            value,
        })
    }
}

/// Look up and validate one call without running it.
pub fn resolve(registry: &ToolRegistry, call: &ToolCallRequest) -> Result<Invocation> {
    let operation = registry.lookup(&call.name)?;

    let arguments = normalize_integral_numbers(&call.arguments);
    registry.validate_arguments(&call.name, &arguments)?;

    Ok(Invocation {
        call_id: call.id.clone(),
        name: call.name.clone(),
        operation,
        operands: Operands {
            a: integer_arg(&arguments, "a", &call.name)?,
            b: integer_arg(&arguments, "b", &call.name)?,
        },
    })
}

/// Resolve every call of a turn. Nothing runs unless all of them resolve.
pub fn resolve_all(registry: &ToolRegistry, calls: &[ToolCallRequest]) -> Result<Vec<Invocation>> {
    calls.iter().map(|call| resolve(registry, call)).collect()
}

pub fn call_local_tool(registry: &ToolRegistry, call: &ToolCallRequest) -> Result<ToolCallResult> {
    let result = resolve(registry, call)?.evaluate()?;
    tracing::debug!(
        tool = %result.name,
        call_id = %result.call_id,
        value = result.value,
        "tool executed"
    );
    Ok(result)
}

fn integer_arg(args: &Value, key: &str, tool: &str) -> Result<i128> {
    let value = args.get(key);
    value
        .and_then(Value::as_i64)
        .map(i128::from)
        .or_else(|| value.and_then(Value::as_u64).map(i128::from))
        .ok_or_else(|| CalcError::invalid_arguments(tool, format!("'{}' must be an integer", key)))
}

// Some models send integers as `5.0`; treat those as the integer they denote.
fn normalize_integral_numbers(arguments: &Value) -> Value {
    match arguments {
        Value::Object(map) => {
            let normalized: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), normalize_number(v)))
                .collect();
            Value::Object(normalized)
        }
        other => other.clone(),
    }
}

fn normalize_number(value: &Value) -> Value {
    match value {
        Value::Number(n) if !n.is_i64() && !n.is_u64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Value::Number(Number::from(f as i64))
            }
            Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => {
                Value::Number(Number::from(f as u64))
            }
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}
