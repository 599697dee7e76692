use serde_json::{json, Map, Value};

pub fn add_nums(a: i128, b: i128) -> Option<i128> {
    a.checked_add(b)
}

pub fn subtract_nums(a: i128, b: i128) -> Option<i128> {
    a.checked_sub(b)
}

pub fn multiply_nums(a: i128, b: i128) -> Option<i128> {
    a.checked_mul(b)
}

/// The fixed set of operations a model may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Add, Operation::Subtract, Operation::Multiply];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add => "add_nums",
            Operation::Subtract => "subtract_nums",
            Operation::Multiply => "multiply_nums",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Returns `None` only if the result does not fit in an `i128`.
    pub fn apply(&self, a: i128, b: i128) -> Option<i128> {
        match self {
            Operation::Add => add_nums(a, b),
            Operation::Subtract => subtract_nums(a, b),
            Operation::Multiply => multiply_nums(a, b),
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        let description = match self {
            Operation::Add => "adds numbers a and b together",
            Operation::Subtract => "subtracts number b from number a",
            Operation::Multiply => "multiplies numbers a and b together",
        };

        ToolDescriptor {
            name: self.name().to_string(),
            description: description.to_string(),
            parameters: vec![
                ParameterSpec::integer("a", "The first number"),
                ParameterSpec::integer("b", "The second number"),
            ],
            required: vec!["a".to_string(), "b".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: String,
    pub description: String,
}

impl ParameterSpec {
    pub fn integer(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: "integer".to_string(),
            description: description.to_string(),
        }
    }
}

/// What the model is told about a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    pub required: Vec<String>,
}

impl ToolDescriptor {
    /// JSON schema of the argument object, properties in declaration order.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind,
                    "description": param.description,
                }),
            );
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }

    /// Stricter than the advertised schema: undeclared arguments are rejected.
    pub fn validation_schema(&self) -> Value {
        let mut schema = self.parameters_schema();
        schema["additionalProperties"] = Value::Bool(false);
        schema
    }

    pub fn to_function_tool(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema(),
            }
        })
    }
}
