//! SwiftSmith CLI
//!
//! Asks questions about a Swift project through the architect → developer
//! pipeline. The session (thread, summaries, disclosure state) is saved in
//! `.swiftsmith/session.json` so consecutive invocations share one
//! conversation.

mod select;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use swiftsmith_core::models::openai::OpenAiBackend;
use swiftsmith_core::render::Console;
use swiftsmith_core::state::{io as runtime, load_snapshot, save_snapshot};
use swiftsmith_core::{AssistantConfig, CodingAssistant};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone)]
#[command(author, version, about = "SwiftSmith - plan-then-code assistant for Swift projects")]
struct Args {
    /// Project root to scan; repeat for several targets
    #[arg(long = "root", global = true)]
    roots: Vec<PathBuf>,
    /// Source file extension to scan
    #[arg(long, global = true)]
    extension: Option<String>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Write .swiftsmith/config.json for the given roots
    Init,
    /// Ask the assistant for a change
    Ask {
        /// The request, e.g. "Add a settings screen"
        question: String,
        /// Regenerate every file summary first
        #[arg(long)]
        force_summaries: bool,
        /// Pick files to share in full with the architect
        #[arg(long)]
        select: bool,
        /// Print the reply without highlighting
        #[arg(long)]
        raw: bool,
    },
    /// Refresh and print the file summaries
    Summaries {
        /// Regenerate every summary
        #[arg(long)]
        force: bool,
    },
    /// Show the saved session
    Status,
    /// Forget the saved session; the next ask starts a new conversation
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,swiftsmith=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = AssistantConfig::load(&runtime::config_path())?
        .with_roots(args.roots.clone())
        .with_extension(args.extension.clone());

    match args.command {
        CliCommand::Init => init(&config).await,
        CliCommand::Ask {
            question,
            force_summaries,
            select,
            raw,
        } => ask(&config, &question, force_summaries, select, raw).await,
        CliCommand::Summaries { force } => summaries(&config, force).await,
        CliCommand::Status => status(),
        CliCommand::Reset => reset().await,
    }
}

async fn init(config: &AssistantConfig) -> Result<()> {
    config.validate()?;
    runtime::ensure_runtime_dir().await?;
    let path = runtime::config_path();
    config.save(&path)?;

    println!("Wrote {}", path.display());
    for root in &config.roots {
        println!("   {} ({} target)", root.path.display(), root.target_name());
    }
    Ok(())
}

/// Resume the saved session, or open a new one
async fn open_session(config: &AssistantConfig) -> Result<CodingAssistant<OpenAiBackend>> {
    config.validate()?;
    let backend = config.models.create_backend()?;

    match load_snapshot(&runtime::session_path())? {
        Some(snapshot) => Ok(CodingAssistant::resume(config, backend, snapshot)),
        None => {
            tracing::info!("No saved session, starting a new conversation");
            Ok(CodingAssistant::open(config, backend).await?)
        }
    }
}

fn save_session(assistant: &CodingAssistant<OpenAiBackend>) -> Result<()> {
    save_snapshot(&runtime::session_path(), &assistant.snapshot())
}

async fn ask(
    config: &AssistantConfig,
    question: &str,
    force_summaries: bool,
    select: bool,
    raw: bool,
) -> Result<()> {
    let mut assistant = open_session(config).await?;

    // The selection refresh already honored --force-summaries
    let mut force_summaries = force_summaries;
    if select {
        assistant.refresh(force_summaries).await?;
        force_summaries = false;
        let stdin = io::stdin();
        let names = select::choose_files(assistant.summaries(), stdin.lock(), &mut io::stderr())?;
        assistant.select_files(names)?;
    }

    // Posted messages stay on the thread, so save even when the round fails
    let outcome = assistant.ask(question, force_summaries).await;
    save_session(&assistant)?;
    let answer = outcome?;

    let console = if raw {
        Console::plain()
    } else {
        Console::new(&config.theme)
    };
    let mut stdout = io::stdout().lock();
    console
        .render(&mut stdout, &answer.text)
        .context("Failed to write the answer")?;
    if !answer.disclosed.is_empty() {
        tracing::info!(files = ?answer.disclosed, "Shared in full");
    }
    Ok(())
}

async fn summaries(config: &AssistantConfig, force: bool) -> Result<()> {
    let mut assistant = open_session(config).await?;
    let report = assistant.refresh(force).await?;
    save_session(&assistant)?;

    let mut stdout = io::stdout().lock();
    for (name, summary) in assistant.summaries().iter() {
        let target = assistant
            .files()
            .get(name)
            .map(|f| f.target.as_str())
            .unwrap_or_default();
        writeln!(stdout, "{name} [{target}]\n  {summary}\n")?;
    }
    writeln!(
        stdout,
        "{} generated, {} pruned",
        report.summaries.generated.len(),
        report.summaries.pruned.len()
    )?;
    Ok(())
}

fn status() -> Result<()> {
    let Some(snapshot) = load_snapshot(&runtime::session_path())? else {
        println!("No saved session");
        return Ok(());
    };

    println!("Thread:     {}", snapshot.thread);
    println!("Saved at:   {}", snapshot.saved_at.to_rfc3339());
    println!("First round pending: {}", snapshot.first_round);
    println!(
        "Files:      {} known, {} disclosed, {} summarized",
        snapshot.files.known_names().len(),
        snapshot.files.disclosed_names().len(),
        snapshot.summaries.len()
    );
    if let Some(plan) = &snapshot.last_plan {
        println!("Last plan:  {}", serde_json::to_string_pretty(plan)?);
    }
    Ok(())
}

async fn reset() -> Result<()> {
    if runtime::remove_if_exists(runtime::session_path()).await? {
        println!("Session cleared");
    } else {
        println!("No saved session");
    }
    Ok(())
}
