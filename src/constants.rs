// src/constants.rs

//! Defaults and fixed markers.

/// The name of the directory holding the configuration (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "interactive-shell";

/// The name of the main configuration file (inside the configuration directory).
pub const CONFIG_FILENAME: &str = "config.toml";

/// Default time between two completion checks of a running command.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default budget for a single command.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default cadence of "still running" notifications for verbose sessions.
pub const DEFAULT_PROGRESS_INTERVAL_SECS: u64 = 1;

/// Text that marks a result item as a failure signal. Case-sensitive, matched anywhere.
pub const FAILURE_MARKER: &str = "failed";

/// Separator used when aggregating several messages into one.
pub const MESSAGE_SEPARATOR: &str = ";";
