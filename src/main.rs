//! apm-trace CLI
//!
//! Aggregates invocation traces and measurement records into JSON reports
//! and estimates the memory they hold.

use anyhow::Result;
use apm_trace_core::commands::{display_version, execute_aggregate, execute_size, AggregateArgs, SizeArgs};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

/// apm-trace - aggregation of application performance measurements
#[derive(Parser, Debug)]
#[command(name = "apm-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate traces and records into a report
    Aggregate {
        /// Trace input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Input traces are flat records linked by parent id
        #[arg(long)]
        flat: bool,

        /// Engine configuration TOML
        #[arg(short, long, env = "APM_TRACE_CONFIG")]
        config: Option<PathBuf>,

        /// Output path for the JSON report
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Keep only the N largest aggregates per table
        #[arg(long)]
        top: Option<usize>,
    },

    /// Print the estimated memory held by each trace
    Size {
        /// Trace input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Input traces are flat records linked by parent id
        #[arg(long)]
        flat: bool,

        /// Engine configuration TOML
        #[arg(short, long, env = "APM_TRACE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Aggregate {
            input,
            flat,
            config,
            output,
            summary,
            top,
        } => {
            if top == Some(0) {
                anyhow::bail!("--top must be greater than 0");
            }
            execute_aggregate(AggregateArgs {
                input,
                flat,
                config,
                output,
                print_summary: summary,
                top,
            })?;
        }

        Commands::Size { input, flat, config } => {
            execute_size(SizeArgs { input, flat, config })?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
