// src/models.rs

//! Output items, outcomes and the TOML configuration models.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_PROGRESS_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS,
};
use crate::system::shells_config;

// --- EXECUTION MODELS ---

/// A single entry of an interpreter's result stream.
///
/// Interpreters may push "nothing" into their output (`None`); such entries are
/// tolerated and skipped during triage.
pub type OutputItem = Option<serde_json::Value>;

/// Renders a non-null output value to the text used for echoing and triage.
/// Strings are taken verbatim, every other value uses its JSON representation.
pub fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The result of a single command invocation. Exactly one is produced per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command finished without errors and without a failure marker in its output.
    Success,
    /// The command finished but signaled failure; `message` aggregates the relevant output.
    Failure {
        /// Error items or rendered result items, joined with `;`.
        message: String,
    },
    /// The command was still running when its budget ran out and was force-stopped.
    Timeout {
        /// The budget that was exceeded.
        timeout_secs: u64,
    },
}

impl Outcome {
    /// `true` only for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure { message } => write!(f, "failure: {}", message),
            Self::Timeout { timeout_secs } => {
                write!(f, "Command exceeded timeout of {}s", timeout_secs)
            }
        }
    }
}

// --- CONFIGURATION MODELS (FOR TOML) ---

/// Describes the shell process backing a session.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ShellConfig {
    /// Executable to spawn (looked up in `PATH` when not absolute).
    pub program: PathBuf,
    /// Arguments passed to the shell. They must leave it reading commands from stdin.
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory the shell starts in. `~` and environment variables are expanded.
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Extra environment variables for the shell process.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(shells_config::get_default_shell_name()),
            args: Vec::new(),
            working_dir: None,
            env: HashMap::new(),
        }
    }
}

/// Top-level configuration file (`config.toml`).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct SessionConfig {
    /// Echo output and report progress.
    pub verbose: bool,
    /// Seconds between two progress reports. Only used when `verbose`.
    pub progress_interval_secs: u64,
    /// Send progress and echoed output to the `log` facade instead of stdout.
    pub log_progress: bool,
    /// Milliseconds between two completion checks.
    pub poll_interval_ms: u64,
    /// Default timeout for each command, in seconds.
    pub timeout_secs: u64,
    /// The shell backing the session.
    pub shell: ShellConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            progress_interval_secs: DEFAULT_PROGRESS_INTERVAL_SECS,
            log_progress: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            shell: ShellConfig::default(),
        }
    }
}
