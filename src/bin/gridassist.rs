use clap::{Parser, ValueEnum};
use color_eyre::Result;
use gridassist::config::AssistantConfig;
use gridassist::core::{GridSchema, Record, ViewState};
use gridassist::services::Assistant;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::error;

/// Chat with a data grid: send an instruction, apply the reply to the view
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// JSON file holding the grid rows (an array of objects)
    #[arg(long = "records", value_name = "PATH")]
    records: Option<PathBuf>,
    /// Instruction to run once; omit for an interactive session
    instruction: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cwd = std::env::current_dir()?;
    let log_path = cwd.join("gridassist.log");
    let level = match args.logging {
        Some(LogLevel::Error) => Some(tracing::Level::ERROR),
        Some(LogLevel::Warn) => Some(tracing::Level::WARN),
        Some(LogLevel::Info) => Some(tracing::Level::INFO),
        Some(LogLevel::Debug) => Some(tracing::Level::DEBUG),
        Some(LogLevel::Trace) => Some(tracing::Level::TRACE),
        None => Some(tracing::Level::WARN),
    };
    gridassist::logging::init_with(Some(log_path), level)?;

    let config = AssistantConfig::from_path(args.config.as_ref())
        .map_err(|e| color_eyre::eyre::eyre!("failed to load config: {e}"))?;
    let records = load_records(args.records.as_ref())?;
    let assistant = Assistant::new(config, GridSchema::reporting_templates())
        .map_err(|e| color_eyre::eyre::eyre!("{e}"))?;
    let mut view = ViewState::new();

    if let Some(instruction) = args.instruction {
        run_turn(&assistant, &instruction, &records, &mut view).await;
        return Ok(());
    }

    // Interactive session: one instruction per line, :reset and :quit commands
    println!("{} rows loaded. Type an instruction, :reset, or :quit.", records.len());
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":reset" => {
                view.reset();
                println!("View reset.");
            }
            instruction => run_turn(&assistant, instruction, &records, &mut view).await,
        }
    }
    Ok(())
}

async fn run_turn(assistant: &Assistant, instruction: &str, records: &[Record], view: &mut ViewState) {
    let Some(response) = assistant.respond_latest(instruction, records).await else {
        // A newer turn superseded this one; nothing to apply
        return;
    };
    view.apply(&response, records);
    for message in &response.messages {
        println!("assistant: {message}");
    }
    print_view(view, records);
}

fn print_view(view: &ViewState, records: &[Record]) {
    if !view.has_operations() {
        return;
    }
    for index in view.project(records) {
        let marker = if view.highlighted.contains(&index) { "*" } else { " " };
        let row = serde_json::to_string(&records[index]).unwrap_or_default();
        println!("{marker} [{index:>3}] {row}");
    }
}

fn load_records(path: Option<&PathBuf>) -> Result<Vec<Record>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        error!("failed to parse records file {}: {e}", path.display());
        color_eyre::eyre::eyre!("records file {} is not a JSON array of objects: {e}", path.display())
    })
}
