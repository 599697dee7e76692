mod output;

pub use output::{display_answer, display_provider_header, display_tool_trace, print_tool_schemas};
