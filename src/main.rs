//! Command-line entry point

use clap::{Args, Parser, Subcommand};
use imagegen_fallback::{
    config::{LoggingConfig, Settings},
    gateway::FallbackOrchestrator,
    output::GenerationResult,
    provider::{GenerationRequest, ImageSize, ProviderRegistry},
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "imagegen")]
#[command(about = "Generate images through several providers with automatic fallback")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image from a text prompt
    Generate(GenerateArgs),

    /// List registered providers in fallback order
    Providers,

    /// List previously generated images
    History,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Provider to use instead of the fallback order
    provider: Option<String>,

    /// Image size as WxH (defaults to the configured size)
    size: Option<String>,

    /// Extra provider option as key=value (e.g. quality=hd, model=...)
    #[arg(short = 'o', long = "option", value_parser = parse_key_val)]
    options: Vec<(String, String)>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let json = logging.format == "json";

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    init_tracing(&settings.logging);
    info!(output_dir = %settings.output_dir, "Loaded configuration");

    let registry = Arc::new(ProviderRegistry::from_settings(&settings)?);
    let orchestrator = FallbackOrchestrator::new(registry, &settings)?;

    match cli.command {
        Commands::Generate(args) => generate(&orchestrator, args, cli.json).await,
        Commands::Providers => {
            list_providers(&orchestrator, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::History => {
            history(&orchestrator, cli.json).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn generate(
    orchestrator: &FallbackOrchestrator,
    args: GenerateArgs,
    json_output: bool,
) -> anyhow::Result<ExitCode> {
    let mut request = GenerationRequest::new(args.prompt);
    if let Some(provider) = args.provider {
        request = request.with_provider(provider);
    }
    if let Some(size) = args.size {
        request = request.with_size(size.parse::<ImageSize>()?);
    }
    for (key, value) in args.options {
        request = request.with_option(key, value);
    }

    let result = orchestrator.generate(request).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match &result {
            GenerationResult::Success {
                provider, filepath, ..
            } => {
                println!("[SUCCESS] Image generated by {}", provider);
                println!("Saved to: {}", filepath.display());
            }
            GenerationResult::Failure { reason, .. } => {
                println!("[FAILED] {}", reason);
            }
        }
    }

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn list_providers(orchestrator: &FallbackOrchestrator, json_output: bool) -> anyhow::Result<()> {
    let registry = orchestrator.router().registry();
    let candidates = orchestrator.router().route(None);
    let order: Vec<&str> = candidates.iter().map(|c| c.name()).collect();

    if json_output {
        let providers: Vec<serde_json::Value> = registry
            .entries()
            .iter()
            .map(|entry| {
                let config = entry.config();
                serde_json::json!({
                    "name": entry.name(),
                    "enabled": config.enabled,
                    "priority": config.priority,
                    "has_credential": config.has_credential(),
                })
            })
            .collect();
        let output = serde_json::json!({ "providers": providers, "fallback_order": order });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{:<14} {:<8} {:>8}  credential", "provider", "enabled", "priority");
    for entry in registry.entries() {
        let config = entry.config();
        println!(
            "{:<14} {:<8} {:>8}  {}",
            entry.name(),
            config.enabled,
            config.priority,
            if config.has_credential() { "yes" } else { "no" }
        );
    }
    println!();
    println!("Fallback order: {}", order.join(" -> "));
    Ok(())
}

async fn history(orchestrator: &FallbackOrchestrator, json_output: bool) -> anyhow::Result<()> {
    let records = orchestrator.writer().list_metadata().await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!(
            "No images in {}",
            orchestrator.writer().output_dir().display()
        );
        return Ok(());
    }

    for record in records {
        println!(
            "{}  {:<12} {:<10} {}",
            record.filename, record.provider, record.size, record.prompt
        );
    }
    Ok(())
}
