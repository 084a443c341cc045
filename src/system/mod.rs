//! # System Interaction Layer
//!
//! Everything that actually runs commands lives here, behind the `Interpreter` contract.
//!
//! ## Modules
//!
//! - **`interpreter`**: The `Interpreter` and `Completion` traits a session drives, and the
//!   `InterpreterError` they report.
//! - **`shell`**: `ShellInterpreter`, a persistent POSIX shell process fed through its stdin.
//! - **`shells_config`**: Default shell detection and parsing of shell command lines.
//! - **`mock`**: `ScriptedInterpreter`, a deterministic stand-in that replays recorded runs.

pub mod interpreter;
pub mod mock;
pub mod shell;
pub mod shells_config;
