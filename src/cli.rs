use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Overrides, RecordFormat};
use crate::interval;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "synthlog",
    about = "Synthetic structured log generator for exercising log pipelines",
    version = env!("GIT_DESCRIBE"),
    after_help = "Environment:\n  LOG_INTERVAL     pause between records (e.g. 500ms, 2s); default 1s\n  TOTAL_LOGS       number of records to emit; default unbounded\n  SYNTHLOG_CONFIG  path to a synthlog.yaml config file\n\nDiagnostics are written to stderr; records go to stdout."
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to synthlog.yaml config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose diagnostics on stderr")]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, help = "Suppress non-error diagnostics")]
    pub quiet: bool,

    /// Defaults to `run` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Emit synthetic log records to stdout
    Run(RunArgs),

    /// Check a captured record stream for gaps and malformed records
    Verify {
        /// JSONL file to read (reads stdin if omitted or "-")
        input: Option<PathBuf>,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Pause between records, e.g. 500ms or 2s (overrides LOG_INTERVAL)
    #[arg(long, short = 'i', value_parser = parse_interval_arg)]
    pub interval: Option<Duration>,

    /// Number of records to emit, negative for unbounded (overrides TOTAL_LOGS)
    #[arg(long, short = 'n', allow_negative_numbers = true)]
    pub total: Option<i64>,

    /// Seed the generator for a reproducible stream
    #[arg(long)]
    pub seed: Option<u64>,

    /// Language tag stamped on every record
    #[arg(long)]
    pub language: Option<String>,

    /// Record encoding
    #[arg(long, short = 'f', value_enum)]
    pub format: Option<RecordFormat>,
}

impl RunArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            interval: self.interval,
            total: self.total,
            seed: self.seed,
            language: self.language.clone(),
            format: self.format,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective settings after applying file, environment and flags
    Show {
        #[command(flatten)]
        run: RunArgs,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        output: Option<OutputFormat>,
    },
}

fn parse_interval_arg(value: &str) -> Result<Duration, String> {
    interval::parse(value).ok_or_else(|| format!("invalid duration {:?} (expected e.g. 500ms, 2s, 1m30s)", value))
}
