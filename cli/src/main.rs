//! CLI entrypoint for courier
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{bail, Context, Result};
use clap::Parser;
use courier_application::{
    DecomposeQueryUseCase, ExecuteGraphUseCase, NoProgress, NoTraceLogger, PipelineProgress,
    ProcessQueryInput, ProcessQueryUseCase, QueryOutcome, StrategyRegistry,
    SynthesizeAnswerUseCase, TraceLogger,
};
use courier_infrastructure::{ConfigLoader, JsonMailStore, JsonlTraceLogger, OpenAiGateway};
use courier_presentation::{ChatRepl, Cli, ConsoleFormatter, ProgressReporter};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting courier");

    // Load and validate configuration
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("could not load configuration")?
    };
    config.validate().context("invalid configuration")?;

    let mailbox_path: PathBuf = match cli
        .mailbox
        .clone()
        .or_else(|| config.corpus.mailbox.clone().map(PathBuf::from))
    {
        Some(path) => path,
        None => bail!("No mailbox corpus. Pass --mailbox or set corpus.mailbox in the config."),
    };

    // === Dependency Injection ===
    let store = Arc::new(
        JsonMailStore::load(&mailbox_path)
            .with_context(|| format!("could not load mailbox {}", mailbox_path.display()))?,
    );
    let gateway = Arc::new(OpenAiGateway::from_config(&config.model)?);
    let params = config.pipeline_params();

    let trace: Arc<dyn TraceLogger> = match &config.logging.trace_file {
        Some(path) => match JsonlTraceLogger::new(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoTraceLogger),
        },
        None => Arc::new(NoTraceLogger),
    };

    let registry = StrategyRegistry::full(
        store.clone(),
        store.clone(),
        gateway.clone(),
        &params,
    );
    let use_case = Arc::new(ProcessQueryUseCase::new(
        DecomposeQueryUseCase::new(gateway.clone()),
        ExecuteGraphUseCase::new(registry, params.max_in_flight),
        SynthesizeAnswerUseCase::new(gateway, params),
        trace,
    ));

    // Chat mode
    if cli.chat {
        let repl = ChatRepl::new(use_case, whoami())
            .with_progress(!cli.quiet)
            .with_auto_confirm(cli.yes)
            .with_preferences(cli.preferences.clone());

        repl.run().await?;
        return Ok(());
    }

    // Single question mode - question is required
    let question = match cli.question {
        Some(q) => q,
        None => bail!("Question is required. Use --chat for interactive mode."),
    };

    let mut input = ProcessQueryInput::new(question, whoami());
    if let Some(preferences) = &cli.preferences {
        input = input.with_preferences(preferences.clone());
    }
    if cli.yes {
        input = input.confirmed();
    }

    let mut outcome = execute(&use_case, input.clone(), cli.quiet).await?;

    if let QueryOutcome::ConfirmationNeeded { estimate, .. } = &outcome {
        print!("{}", ConsoleFormatter::format_estimate(estimate));
        if !confirm_on_stdin()? {
            println!("Skipped.");
            return Ok(());
        }
        outcome = execute(&use_case, input.confirmed(), cli.quiet).await?;
    }

    let QueryOutcome::Answer(response) = outcome else {
        bail!("plan still requires confirmation");
    };

    let output = if cli.json {
        ConsoleFormatter::format_json(&response)
    } else if cli.quiet {
        ConsoleFormatter::format_answer_only(&response)
    } else {
        ConsoleFormatter::format(&response)
    };
    println!("{}", output);

    Ok(())
}

async fn execute(
    use_case: &ProcessQueryUseCase,
    input: ProcessQueryInput,
    quiet: bool,
) -> Result<QueryOutcome> {
    let progress: Box<dyn PipelineProgress> = if quiet {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new())
    };
    Ok(use_case.execute(input, progress.as_ref()).await?)
}

fn confirm_on_stdin() -> Result<bool> {
    print!("Proceed? [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "local".to_string())
}
