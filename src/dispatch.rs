use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{CalcError, Result};
use crate::models::{Conversation, Message, ToolCallRequest};
use crate::providers::{ChatProvider, Completion, ToolChoice};
use crate::tools::{resolve_all, ToolDescriptor, ToolRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CallingMode {
    /// Keep running requested tools until the model answers in text.
    #[serde(alias = "auto")]
    #[value(alias = "auto")]
    Automatic,
    /// One tool round, then a follow-up with tools disabled.
    #[default]
    Manual,
}

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub mode: CallingMode,
    /// Tool choice for the first request of the exchange.
    pub tool_choice: ToolChoice,
    pub max_tool_rounds: usize,
    pub system_instruction: Option<String>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            mode: CallingMode::Manual,
            tool_choice: ToolChoice::Auto,
            max_tool_rounds: crate::config::defaults::default_max_tool_rounds(),
            system_instruction: None,
        }
    }
}

/// Outcome of one prompt: the final text plus the full transcript.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub answer: String,
    pub conversation: Conversation,
    pub tool_rounds: usize,
}

pub struct Dispatcher {
    provider: Arc<dyn ChatProvider>,
    registry: Arc<ToolRegistry>,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn ChatProvider>, registry: Arc<ToolRegistry>, options: DispatchOptions) -> Self {
        Self {
            provider,
            registry,
            options,
        }
    }

    pub fn provider(&self) -> &dyn ChatProvider {
        self.provider.as_ref()
    }

    pub async fn run(&self, prompt: &str) -> Result<Exchange> {
        let mut conversation = Conversation::new(self.options.system_instruction.as_deref());
        conversation.push(Message::user(prompt));
        let tools = self.registry.descriptors();

        tracing::debug!(
            provider = self.provider.provider_name(),
            model = self.provider.model_id(),
            mode = ?self.options.mode,
            tools = ?self.registry.names(),
            "dispatching prompt"
        );

        match self.options.mode {
            CallingMode::Manual => self.run_manual(conversation, &tools).await,
            CallingMode::Automatic => self.run_automatic(conversation, &tools).await,
        }
    }

    async fn run_manual(&self, mut conversation: Conversation, tools: &[&ToolDescriptor]) -> Result<Exchange> {
        let first = self
            .provider
            .complete(&conversation, tools, self.options.tool_choice)
            .await?;

        let (content, calls) = match first {
            Completion::Text(answer) => return Ok(finish(conversation, answer, 0)),
            Completion::ToolCalls { content, calls } => (content, calls),
        };

        self.execute_round(&mut conversation, content, calls)?;

        match self.provider.complete(&conversation, tools, ToolChoice::None).await? {
            Completion::Text(answer) => Ok(finish(conversation, answer, 1)),
            Completion::ToolCalls { calls, .. } => Err(CalcError::provider(
                self.provider.provider_name(),
                format!(
                    "follow-up response requested {} more tool call(s) with tools disabled",
                    calls.len()
                ),
            )),
        }
    }

    async fn run_automatic(&self, mut conversation: Conversation, tools: &[&ToolDescriptor]) -> Result<Exchange> {
        let mut rounds = 0;
        let mut choice = self.options.tool_choice;

        loop {
            match self.provider.complete(&conversation, tools, choice).await? {
                Completion::Text(answer) => return Ok(finish(conversation, answer, rounds)),
                Completion::ToolCalls { content, calls } => {
                    if rounds >= self.options.max_tool_rounds {
                        return Err(CalcError::ToolRoundsExceeded(self.options.max_tool_rounds));
                    }
                    self.execute_round(&mut conversation, content, calls)?;
                    rounds += 1;
                    // Forcing a call every round would never terminate.
                    if choice == ToolChoice::Any {
                        choice = ToolChoice::Auto;
                    }
                }
            }
        }
    }

    /// Runs one turn's calls and appends the assistant turn plus one result per call.
    fn execute_round(
        &self,
        conversation: &mut Conversation,
        content: Option<String>,
        calls: Vec<ToolCallRequest>,
    ) -> Result<()> {
        let invocations = resolve_all(&self.registry, &calls)?;
        conversation.push(Message::assistant(content, calls));

        for invocation in invocations {
            let result = invocation.evaluate()?;
            tracing::debug!(
                tool = %result.name,
                call_id = %result.call_id,
                a = %invocation.operands.a,
                b = %invocation.operands.b,
                value = result.value,
                "tool executed"
            );
            conversation.push(Message::tool(result));
        }

        Ok(())
    }
}

fn finish(mut conversation: Conversation, answer: String, tool_rounds: usize) -> Exchange {
    conversation.push(Message::assistant(Some(answer.clone()), Vec::new()));
    Exchange {
        answer,
        conversation,
        tool_rounds,
    }
}
