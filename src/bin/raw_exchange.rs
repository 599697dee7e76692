use clap::Parser;
use colored::*;
use serde_json::Value;

use calcbot::cli::Args;
use calcbot::config::{defaults, Config, FileConfig};
use calcbot::models::{Conversation, Message};
use calcbot::providers::{GeminiProvider, MistralProvider, ProviderKind, ToolChoice};
use calcbot::tools::ToolRegistry;

/// Send one prompt with the arithmetic tools and dump the provider's raw JSON.
#[derive(Parser, Debug)]
#[command(name = "raw-exchange")]
struct RawArgs {
    #[arg(value_enum, help = "Provider to query")]
    provider: ProviderKind,

    #[arg(long = "tool-choice", value_enum, default_value_t = ToolChoice::Auto)]
    tool_choice: ToolChoice,

    #[arg(help = "Prompt to send")]
    prompt: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let raw_args = RawArgs::parse();
    let args = Args {
        provider: raw_args.provider.into(),
        tool_choice: Some(raw_args.tool_choice),
        prompt: raw_args.prompt.clone(),
        ..Args::default()
    };

    let config = Config::from_env_and_args(&args, &FileConfig::load()?)?;
    let Some(settings) = config.provider(raw_args.provider) else {
        return Err(format!("{} is not configured", raw_args.provider.name()).into());
    };

    let prompt = args
        .prompt_text()
        .unwrap_or_else(|| defaults::demo_prompt(raw_args.provider).to_string());
    let registry = ToolRegistry::arithmetic()?;
    let tools = registry.descriptors();

    let mut conversation = Conversation::new(config.system_instruction.as_deref());
    conversation.push(Message::user(prompt.as_str()));

    println!("{}", format!("Provider: {}", settings.kind.name()).green());
    println!("{}", format!("Model: {}", settings.model).green());
    println!("{}", format!("Prompt: {}", prompt).cyan());
    println!("{}", "-".repeat(80).dimmed());

    let (request_body, response): (Value, Value) = match settings.kind {
        ProviderKind::Gemini => {
            let provider = GeminiProvider::new(
                &settings.api_key,
                &settings.model,
                settings.endpoint.clone(),
                config.request_timeout(),
            )?;
            let body = provider.build_request(&conversation, &tools, settings.tool_choice);
            println!("{}", format!("POST {}", provider.endpoint()).bold());
            let response = provider.send_raw(&body).await?;
            (body, response)
        }
        ProviderKind::Mistral => {
            let provider = MistralProvider::new(
                &settings.api_key,
                &settings.model,
                settings.endpoint.clone(),
                config.request_timeout(),
            )?;
            let body = provider.build_request(&conversation, &tools, settings.tool_choice);
            println!("{}", format!("POST {}", provider.endpoint()).bold());
            let response = provider.send_raw(&body).await?;
            (body, response)
        }
    };

    println!("{}", "Request payload:".bold());
    println!("{}", serde_json::to_string_pretty(&request_body)?);
    println!("{}", "-".repeat(80).dimmed());
    println!("{}", "Raw response:".bold());
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
