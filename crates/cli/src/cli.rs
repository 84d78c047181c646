//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Transcript - buffer structured log events and deliver them as one message
#[derive(Parser, Debug)]
#[command(
    name = "transcript-cli",
    author,
    version,
    about = "Render log events and deliver them as a single transcript",
    long_about = "Accumulates structured log events rendered through an output template \n\
                  and delivers the buffered lines as one message when flushed.\n\n\
                  Input is JSON lines, one LogEvent per line."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TRANSCRIPT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "TRANSCRIPT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Also deliver this command's own log as a transcript into DIR on exit
    #[arg(long, global = true, env = "TRANSCRIPT_RUN_LOG_DIR")]
    pub run_log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Emit events into a sink and deliver transcripts to a pickup directory
    Run(RunArgs),

    /// Render events through an output template and print the lines
    Render(RenderArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// JSON-lines event file, `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "transcript.toml",
        env = "TRANSCRIPT_CONFIG"
    )]
    pub config: PathBuf,

    /// Directory receiving one `.eml` file per delivered transcript
    #[arg(long, env = "TRANSCRIPT_PICKUP_DIR")]
    pub pickup_dir: PathBuf,

    /// Recipient address (repeatable)
    #[arg(long = "to")]
    pub to: Vec<String>,

    /// Sender address
    #[arg(long, env = "TRANSCRIPT_FROM")]
    pub from: Option<String>,

    /// Flush after every N events (0 = only at close)
    #[arg(long, default_value = "0")]
    pub batch: usize,

    /// Mailbox capacity between the reader and the sink
    #[arg(long, default_value = "1024", env = "TRANSCRIPT_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TRANSCRIPT_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `render` command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// JSON-lines event file, `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Configuration supplying the template and format provider
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output template overriding the configured one
    #[arg(short, long)]
    pub template: Option<String>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "transcript.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}
