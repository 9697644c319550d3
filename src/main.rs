//! AbogaBot command-line client.
//!
//! Usage:
//!   abogabot generate 42              # stream a new document to stdout
//!   abogabot generate 42 --timeout 300
//!   abogabot latest 42                # newest persisted revision
//!   abogabot history 42
//!   abogabot show 42 <UUID>
//!
//! Logs go to stderr (`RUST_LOG`, default `abogabot=info`); stdout carries
//! only document text.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use abogabot::{AppConfig, AppState, ConfigService};
use abogabot_core::CaseId;

/// Streaming legal-document generation client.
#[derive(Parser, Debug)]
#[command(name = "abogabot", version)]
#[command(about = "Generate and inspect AbogaBot case documents")]
struct Cli {
    /// Config file (default: ~/.abogabot/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL for revision endpoints
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Base URL of the generation service
    #[arg(long, global = true)]
    generator_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new document, streaming it to stdout
    Generate {
        case_id: String,
        /// Abort after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Print the latest persisted revision
    Latest { case_id: String },
    /// List revisions, newest first
    History { case_id: String },
    /// Print one revision
    Show { case_id: String, uuid: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("abogabot=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    let state = AppState::from_config(config)?;

    match cli.command {
        Command::Generate { case_id, timeout } => generate(&state, case_id, timeout).await,
        Command::Latest { case_id } => {
            match state.reconciler().latest(&CaseId::from(case_id.as_str())).await? {
                Some(body) => print_document(&body)?,
                None => eprintln!("case {} has no revisions yet", case_id),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::History { case_id } => {
            let history = state.reconciler().history(&CaseId::from(case_id)).await?;
            let mut out = std::io::stdout().lock();
            for summary in history {
                writeln!(
                    out,
                    "{}  {}",
                    summary.uuid,
                    summary.created_at.format("%Y-%m-%dT%H:%M:%S%.f")
                )?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { case_id, uuid } => {
            let body = state
                .reconciler()
                .revision(&CaseId::from(case_id), &uuid)
                .await?;
            print_document(&body)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let service = match &cli.config {
        Some(path) => ConfigService::open(path)?,
        None => ConfigService::new()?,
    };
    let mut config = service.effective_config()?;
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(url) = &cli.generator_url {
        config.generator_base_url = Some(url.clone());
    }
    Ok(config)
}

async fn generate(state: &AppState, case_id: String, timeout: Option<u64>) -> Result<ExitCode> {
    let mut options = state.generation_options();
    if let Some(secs) = timeout {
        options.timeout = Some(Duration::from_secs(secs));
    }

    let view = state.document(case_id);
    let mut stdout = std::io::stdout();
    let generation = view.generate_with_options(options, |chunk| {
        // A closed stdout must not abort the run.
        let _ = stdout.write_all(chunk.as_bytes());
        let _ = stdout.flush();
    });

    tokio::select! {
        result = generation => match result {
            Ok(text) => {
                if !text.ends_with('\n') {
                    println!();
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                if view.is_incomplete() && !view.content().text().is_empty() {
                    eprintln!();
                    eprintln!("[incomplete] the document above is partial and was not finished");
                }
                eprintln!("error: {}", e);
                Ok(ExitCode::FAILURE)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            eprintln!("generation cancelled");
            Ok(ExitCode::from(130))
        }
    }
}

fn print_document(body: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(body.as_bytes())?;
    if !body.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}
