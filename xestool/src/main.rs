use std::{
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use xes_tools::{
    event_log::accessors::activities, normalize::canonical_trace_string, EventLog, LoadOptions,
};

#[derive(Parser)]
#[command(name = "xestool", version, about = "Inspect, sort and rewrite XES event logs")]
struct Cli {
    /// Print debug logs to stderr (`RUST_LOG` takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect whether a file is plain or gzip-compressed XES
    Check {
        /// File to probe
        path: PathBuf,
    },
    /// Sort a log by timestamp and write it to a new file
    Sort {
        /// Input `.xes` or `.xes.gz` file
        input: PathBuf,
        /// Output file (gzip-compressed if it ends in `.gz`)
        output: PathBuf,
        /// Event classes breaking timestamp ties, highest priority first
        #[arg(long, value_delimiter = ',')]
        priority: Option<Vec<String>>,
    },
    /// Print a JSON summary of a log
    Info {
        /// Input `.xes` or `.xes.gz` file
        path: PathBuf,
        /// Keep the order of the file instead of sorting by timestamp
        #[arg(long)]
        no_sort: bool,
    },
    /// Print the canonical string of every trace, one per line
    Traces {
        /// Input `.xes` or `.xes.gz` file
        path: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct LogSummary {
    traces: usize,
    events: usize,
    activities: Vec<String>,
    sorted: bool,
}

fn summarize(log: &EventLog) -> anyhow::Result<LogSummary> {
    let mut activities: Vec<String> = activities(log)?.into_iter().collect();
    activities.sort();
    Ok(LogSummary {
        traces: log.traces.len(),
        events: log.num_events(),
        activities,
        sorted: log.is_sorted_by_timestamp()?,
    })
}

fn load(path: &Path, options: LoadOptions) -> anyhow::Result<EventLog> {
    xes_tools::load_xes(path, options).with_context(|| format!("failed to load {}", path.display()))
}

fn run(command: Command, out: &mut impl Write) -> anyhow::Result<ExitCode> {
    match command {
        Command::Check { path } => match xes_tools::detect_encoding(&path)? {
            Some(encoding) => writeln!(out, "{encoding}")?,
            None => {
                writeln!(out, "unrecognized")?;
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::Sort {
            input,
            output,
            priority,
        } => {
            let log = load(
                &input,
                LoadOptions {
                    priority_classes: priority,
                    ..Default::default()
                },
            )?;
            xes_tools::save_xes(&log, &output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            tracing::info!(
                input = %input.display(),
                output = %output.display(),
                traces = log.traces.len(),
                "sorted log"
            );
        }
        Command::Info { path, no_sort } => {
            let log = load(
                &path,
                LoadOptions {
                    sort_by_timestamp: !no_sort,
                    ..Default::default()
                },
            )?;
            serde_json::to_writer_pretty(&mut *out, &summarize(&log)?)?;
            writeln!(out)?;
        }
        Command::Traces { path } => {
            let log = load(&path, LoadOptions::default())?;
            for trace in &log.traces {
                writeln!(out, "{}", canonical_trace_string(trace)?)?;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let stdout = std::io::stdout();
    run(cli.command, &mut stdout.lock())
}
