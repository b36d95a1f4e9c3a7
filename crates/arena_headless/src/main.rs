//! Headless arena agent runner.
//!
//! This binary runs the decision core without a game connection, controlled
//! via JSON on stdin/stdout. Designed for offline play, CI regression runs,
//! and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p arena_headless
//!
//! # Use a tuned configuration
//! cargo run -p arena_headless -- run --config agent.ron
//!
//! # Replay a session and print the responses
//! cargo run -p arena_headless -- replay --file session.jsonl
//!
//! # Check a configuration file without running anything
//! cargo run -p arena_headless -- validate --config agent.ron
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arena_headless::{
    config_loader::load_or_default,
    pathfinding::GridOracle,
    runner::{replay_file, verify_replay, HeadlessRunner},
    RunnerError,
};

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless arena agent runner for offline play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session on stdin/stdout
    Run {
        /// Agent configuration (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Replay a recorded JSON-lines session
    Replay {
        /// Session file path
        #[arg(short, long)]
        file: PathBuf,

        /// Agent configuration (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Replay several times and check the runs agree
        #[arg(long)]
        verify: bool,

        /// Number of runs when verifying
        #[arg(short, long, default_value = "3")]
        runs: usize,
    },

    /// Parse and validate a configuration file
    Validate {
        /// Agent configuration (RON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for protocol
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Some(Commands::Run { config }) => cmd_run(config),
        Some(Commands::Replay {
            file,
            config,
            verify,
            runs,
        }) => cmd_replay(file, config, verify, runs),
        Some(Commands::Validate { config }) => cmd_validate(config),
        None => cmd_run(None),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Runner failed");
        eprintln!("FATAL: {e}");
        std::process::exit(1);
    }
}

/// Run an interactive session
fn cmd_run(config: Option<PathBuf>) -> Result<(), RunnerError> {
    let config = load_or_default(config.as_deref())?;
    tracing::info!("Starting interactive session");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut runner = HeadlessRunner::new(config, GridOracle::new());
    runner.run(stdin.lock(), stdout.lock())?;
    Ok(())
}

/// Replay a session file, printing its responses
fn cmd_replay(
    file: PathBuf,
    config: Option<PathBuf>,
    verify: bool,
    runs: usize,
) -> Result<(), RunnerError> {
    let config = load_or_default(config.as_deref())?;

    let outcome = if verify {
        verify_replay(&config, GridOracle::new, &file, runs.max(2))?
    } else {
        replay_file(&config, GridOracle::new(), &file)?
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for response in &outcome.responses {
        out.write_all(response.to_json_line().as_bytes())
            .map_err(|e| RunnerError::io("<stdout>", e))?;
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("REPLAY COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Turns: {}", outcome.stats.turns);
    eprintln!("Actions: {}", outcome.stats.actions);
    if outcome.stats.malformed_lines > 0 {
        eprintln!("Malformed lines: {}", outcome.stats.malformed_lines);
    }
    eprintln!("State hash: {:#x}", outcome.state_hash);
    if verify {
        eprintln!("Verified over {} runs", runs.max(2));
    }
    Ok(())
}

/// Validate a configuration file
fn cmd_validate(config: PathBuf) -> Result<(), RunnerError> {
    load_or_default(Some(&config))?;
    eprintln!("{}: OK", config.display());
    Ok(())
}
