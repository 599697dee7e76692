use clap::Parser;
use colored::*;
use serde_json::{json, Value};
use std::env;
use std::process;
use std::sync::Arc;

use calcbot::cli::Args;
use calcbot::config::{self, defaults, Config, FileConfig};
use calcbot::dispatch::Dispatcher;
use calcbot::providers::{build_provider, function_declarations};
use calcbot::tools::ToolRegistry;
use calcbot::{logging, ui, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("{} {}", "Error:".red(), e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let file_config = FileConfig::load()?;
    let verbose = Config::resolve_verbose(&args, &file_config, &|key: &str| env::var(key).ok());
    logging::init(verbose);

    if args.config_init {
        let path = FileConfig::write_example(None)?;
        eprintln!("{}", format!("Wrote example config to {}", path.display()).green());
        return Ok(());
    }

    let registry = Arc::new(ToolRegistry::arithmetic()?);

    if args.list_tools {
        return print_tool_schemas(&registry);
    }

    // Credentials for every selected provider are checked before the first request.
    let config = Config::from_env_and_args(&args, &file_config)?;
    let prompt = args.prompt_text();

    for settings in &config.providers {
        if config.verbose {
            eprintln!("{}", format!("[calcbot] {}", config::describe(settings)).dimmed());
        }

        let provider = build_provider(settings, config.request_timeout())?;
        let dispatcher = Dispatcher::new(provider, registry.clone(), config.dispatch_options(settings));
        let prompt = prompt
            .clone()
            .unwrap_or_else(|| defaults::demo_prompt(settings.kind).to_string());

        let exchange = dispatcher.run(&prompt).await?;

        if config.verbose {
            ui::display_tool_trace(&exchange.conversation);
        }
        ui::display_provider_header(dispatcher.provider().provider_name(), dispatcher.provider().model_id());
        ui::display_answer(&exchange.answer);
    }

    Ok(())
}

fn print_tool_schemas(registry: &ToolRegistry) -> Result<()> {
    let tools = registry.descriptors();
    let schemas = json!({
        "mistral": tools.iter().map(|t| t.to_function_tool()).collect::<Vec<Value>>(),
        "gemini": [function_declarations(&tools)],
    });
    ui::print_tool_schemas(&schemas)?;
    Ok(())
}
