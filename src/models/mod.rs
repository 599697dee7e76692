mod message;
mod tool;

pub use message::{Conversation, Message, Role};
pub use tool::{ToolCallRequest, ToolCallResult};
