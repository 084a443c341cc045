// src/cli.rs

//! Command-line arguments of the `ishell` binary.

use clap::Parser;

/// ishell: run commands one after another in a single persistent shell session.
///
/// Each command is given a timeout. A command fails when it writes anything to
/// stderr, or when one of its output lines contains "failed". Without COMMANDS,
/// one command per line is read from stdin.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Commands to run, in order.
    pub commands: Vec<String>,

    /// Echo command output and report progress while commands run.
    #[arg(long, short)]
    pub verbose: bool,

    /// Seconds between two progress reports (implies --verbose).
    #[arg(long, value_name = "SECS")]
    pub progress: Option<u64>,

    /// Send progress and echoed output to the log (`RUST_LOG=info`) instead of stdout.
    #[arg(long)]
    pub log_progress: bool,

    /// Timeout for each command, in seconds.
    #[arg(long, short, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Milliseconds between two completion checks.
    #[arg(long, value_name = "MS")]
    pub poll_ms: Option<u64>,

    /// Shell to start, with its arguments (e.g. "bash --norc").
    #[arg(long, value_name = "COMMAND_LINE")]
    pub shell: Option<String>,

    /// Path to a config file. Defaults to `<config dir>/interactive-shell/config.toml`.
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<String>,

    /// Keep running the remaining commands after a failure.
    #[arg(long)]
    pub keep_going: bool,
}
