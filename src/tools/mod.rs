mod executor;
mod operations;
mod registry;

pub use executor::{call_local_tool, resolve, resolve_all, Invocation, Operands};
pub use operations::{
    add_nums, multiply_nums, subtract_nums, Operation, ParameterSpec, ToolDescriptor,
};
pub use registry::{RegisteredTool, ToolRegistry};
