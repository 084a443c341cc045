//! # Interpreter Contract
//!
//! The boundary between a session and the engine that actually runs commands.
//! A session only ever talks to an interpreter through these two traits, which keeps
//! the poll loop and the triage rules independent of how commands are executed.

use crate::models::OutputItem;
use thiserror::Error;

/// Faults raised by an interpreter.
#[derive(Error, Debug)]
pub enum InterpreterError {
    /// The engine process could not be launched.
    #[error("Interpreter '{program}' could not be started: {source}")]
    Spawn {
        /// The program that was launched.
        program: String,
        /// The launch error.
        #[source]
        source: std::io::Error,
    },
    /// Talking to the engine failed.
    #[error("Interpreter I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// One of the engine's pipes was not set up.
    #[error("The interpreter's {0} pipe is not available.")]
    PipeUnavailable(&'static str),
    /// The interpreter was used after `release`.
    #[error("The interpreter has already been released.")]
    Released,
    /// Any other engine failure.
    #[error("Interpreter fault: {0}")]
    Engine(String),
}

/// A long-lived engine accepting one script at a time.
///
/// Output is not streamed to callers: once a submission reports completion, the
/// error and result streams hold everything the script produced.
pub trait Interpreter {
    /// Handle returned by [`Interpreter::submit`] for the in-flight script.
    type Completion: Completion;

    /// Discards the leftovers of a previous submission (queued script, buffered output).
    fn clear_pending(&mut self) -> Result<(), InterpreterError>;

    /// Starts `script` asynchronously and returns immediately.
    fn submit(&mut self, script: &str) -> Result<Self::Completion, InterpreterError>;

    /// Error items produced by the last submission, in order.
    fn error_stream(&self) -> Result<Vec<String>, InterpreterError>;

    /// Result items produced by the last submission, in order. May contain `None`.
    fn result_stream(&self) -> Result<Vec<OutputItem>, InterpreterError>;

    /// Frees the engine. Calling it more than once is harmless.
    fn release(&mut self) -> Result<(), InterpreterError>;
}

/// Pollable handle over a submitted script.
pub trait Completion {
    /// Whether the script is done. Never blocks.
    fn is_finished(&mut self) -> Result<bool, InterpreterError>;

    /// Stops the script, whatever it is doing.
    fn force_stop(&mut self) -> Result<(), InterpreterError>;
}
