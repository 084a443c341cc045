// src/core/session.rs

//! # Session
//!
//! A `Session` owns one interpreter and runs commands on it one at a time. Each call to
//! [`Session::execute_command`] goes through the same lifecycle:
//!
//! 1. **Reset**: the interpreter drops whatever is left from the previous command.
//! 2. **Submit**: the command starts asynchronously inside the interpreter.
//! 3. **Poll**: the calling thread sleeps `poll_interval_ms` between completion checks,
//!    emits progress notifications, and force-stops the command once the timeout is reached.
//! 4. **Triage**: the error and result streams are turned into an [`Outcome`].
//!
//! Interpreter faults at any step are wrapped into [`SessionError::CommandExecution`].

use crate::{
    constants::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_SECS},
    core::{
        progress::{ConsoleProgress, LogProgress, ProgressSink, SilentProgress},
        triage,
    },
    models::{Outcome, SessionConfig},
    system::{
        interpreter::{Completion, Interpreter, InterpreterError},
        shell::ShellInterpreter,
    },
};
use std::fmt;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by a [`Session`].
#[derive(Error, Debug)]
pub enum SessionError {
    /// A progress or poll interval of zero.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// An empty command or a zero timeout.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Only produced by [`Outcome::into_result`].
    #[error("Command exceeded timeout of {timeout_secs}s")]
    Timeout {
        /// The budget that was exceeded.
        timeout_secs: u64,
    },
    /// Only produced by [`Outcome::into_result`].
    #[error("{0}")]
    Failure(String),
    /// The interpreter faulted while running `command`.
    #[error("Error executing command '{command}'")]
    CommandExecution {
        /// The command being run.
        command: String,
        /// The interpreter's fault.
        #[source]
        source: InterpreterError,
    },
    /// The interpreter could not be spawned.
    #[error("The interpreter could not be started")]
    Startup(#[source] InterpreterError),
    /// Releasing the interpreter failed.
    #[error("The interpreter could not be released")]
    Release(#[source] InterpreterError),
}

impl Outcome {
    /// Converts a failed or timed out outcome into the matching [`SessionError`].
    pub fn into_result(self) -> Result<(), SessionError> {
        match self {
            Self::Success => Ok(()),
            Self::Failure { message } => Err(SessionError::Failure(message)),
            Self::Timeout { timeout_secs } => Err(SessionError::Timeout { timeout_secs }),
        }
    }
}

fn secs_to_ms(secs: u64, what: &str) -> Option<u64> {
    let ms = secs.checked_mul(1000);
    if ms.is_none() {
        log::debug!("{} of {}s does not fit in milliseconds", what, secs);
    }
    ms
}

/// Runs commands against an exclusively owned interpreter.
pub struct Session<I: Interpreter = ShellInterpreter> {
    interpreter: I,
    verbose: bool,
    progress_interval_ms: Option<u64>,
    poll_interval_ms: u64,
    sink: Box<dyn ProgressSink>,
    released: bool,
}

impl Session<ShellInterpreter> {
    /// A quiet session on the default shell.
    pub fn create() -> Result<Self, SessionError> {
        let interpreter = ShellInterpreter::spawn_default().map_err(SessionError::Startup)?;
        Ok(Self::plain(interpreter))
    }

    /// A verbose session on the default shell, reporting progress every
    /// `progress_interval_secs` seconds.
    pub fn create_verbose(progress_interval_secs: u64) -> Result<Self, SessionError> {
        // Validate before spawning anything.
        validate_progress_interval(progress_interval_secs)?;
        let interpreter = ShellInterpreter::spawn_default().map_err(SessionError::Startup)?;
        Self::verbose(interpreter, progress_interval_secs)
    }

    /// Builds a session from a loaded configuration file.
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        if config.verbose {
            validate_progress_interval(config.progress_interval_secs)?;
        }
        validate_poll_interval(config.poll_interval_ms)?;

        let interpreter =
            ShellInterpreter::spawn(config.shell.clone()).map_err(SessionError::Startup)?;
        let mut session = if config.verbose {
            Self::verbose(interpreter, config.progress_interval_secs)?
        } else {
            Self::plain(interpreter)
        };
        if config.verbose && config.log_progress {
            session = session.with_progress_sink(LogProgress);
        }
        session.set_poll_interval_ms(config.poll_interval_ms)?;
        Ok(session)
    }
}

fn validate_progress_interval(progress_interval_secs: u64) -> Result<u64, SessionError> {
    if progress_interval_secs < 1 {
        return Err(SessionError::InvalidConfiguration(
            "The progress interval must be greater than 0".to_string(),
        ));
    }
    secs_to_ms(progress_interval_secs, "Progress interval").ok_or_else(|| {
        SessionError::InvalidConfiguration(format!(
            "The progress interval of {}s is too large",
            progress_interval_secs
        ))
    })
}

fn validate_poll_interval(ms: u64) -> Result<(), SessionError> {
    if ms < 1 {
        return Err(SessionError::InvalidConfiguration(
            "The poll interval must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

impl<I: Interpreter> Session<I> {
    /// A quiet session: no progress reporting, no echo of output.
    pub fn plain(interpreter: I) -> Self {
        Self {
            interpreter,
            verbose: false,
            progress_interval_ms: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            sink: Box::new(SilentProgress),
            released: false,
        }
    }

    /// A verbose session printing progress and output to the console.
    ///
    /// Fails with [`SessionError::InvalidConfiguration`] if `progress_interval_secs` is 0.
    pub fn verbose(interpreter: I, progress_interval_secs: u64) -> Result<Self, SessionError> {
        let progress_interval_ms = validate_progress_interval(progress_interval_secs)?;
        Ok(Self {
            interpreter,
            verbose: true,
            progress_interval_ms: Some(progress_interval_ms),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            sink: Box::new(ConsoleProgress),
            released: false,
        })
    }

    /// Replaces where progress notifications and echoed output go.
    pub fn with_progress_sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Time between two completion checks.
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Sets the time between two completion checks. Must be at least 1 ms.
    pub fn set_poll_interval_ms(&mut self, ms: u64) -> Result<(), SessionError> {
        validate_poll_interval(ms)?;
        self.poll_interval_ms = ms;
        Ok(())
    }

    /// Whether output is echoed to the progress sink.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// The interpreter this session owns.
    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    /// Runs `command` with the default timeout.
    pub fn execute(&mut self, command: &str) -> Result<Outcome, SessionError> {
        self.execute_command(command, DEFAULT_TIMEOUT_SECS)
    }

    /// Runs `command` and waits for it for at most `timeout_secs` seconds (plus one poll
    /// interval).
    ///
    /// `Ok` carries the outcome of a command that ran: success, failure or timeout. `Err` is
    /// reserved for invalid arguments and interpreter faults. Use [`Outcome::into_result`] to
    /// treat failures and timeouts as errors.
    pub fn execute_command(
        &mut self,
        command: &str,
        timeout_secs: u64,
    ) -> Result<Outcome, SessionError> {
        if command.trim().is_empty() {
            return Err(SessionError::InvalidArgument(
                "The command must not be blank".to_string(),
            ));
        }
        if timeout_secs < 1 {
            return Err(SessionError::InvalidArgument(
                "The timeout must be greater than 0".to_string(),
            ));
        }
        let timeout_ms = secs_to_ms(timeout_secs, "Timeout").ok_or_else(|| {
            SessionError::InvalidArgument(format!("The timeout of {}s is too large", timeout_secs))
        })?;
        log::debug!("Executing '{}' (timeout: {}s)", command, timeout_secs);
        let outcome = self
            .run(command, timeout_secs, timeout_ms)
            .map_err(|source| SessionError::CommandExecution {
                command: command.to_string(),
                source,
            })?;
        log::debug!("'{}' finished: {}", command, outcome);
        Ok(outcome)
    }

    fn run(
        &mut self,
        command: &str,
        timeout_secs: u64,
        timeout_ms: u64,
    ) -> Result<Outcome, InterpreterError> {
        self.interpreter.clear_pending()?;
        let mut completion = self.interpreter.submit(command)?;

        let mut elapsed_ms: u64 = 0;
        let mut intervals_reported: u64 = 0;
        while !completion.is_finished()? {
            if elapsed_ms > 0 {
                if elapsed_ms >= timeout_ms {
                    log::debug!(
                        "'{}' still running after {}ms, stopping it.",
                        command,
                        elapsed_ms
                    );
                    completion.force_stop()?;
                    return Ok(Outcome::Timeout { timeout_secs });
                }

                if let Some(interval_ms) = self.progress_interval_ms {
                    let intervals = elapsed_ms / interval_ms;
                    if intervals > intervals_reported {
                        intervals_reported = intervals;
                        self.sink.report(elapsed_ms / 1000);
                    }
                }
            }

            thread::sleep(Duration::from_millis(self.poll_interval_ms));
            elapsed_ms = elapsed_ms.saturating_add(self.poll_interval_ms);
            log::trace!("'{}' polled at {}ms", command, elapsed_ms);
        }

        let errors = self.interpreter.error_stream()?;
        let results = self.interpreter.result_stream()?;
        Ok(triage::triage(
            &errors,
            &results,
            self.verbose,
            self.sink.as_mut(),
        ))
    }

    /// Releases the interpreter now instead of when the session is dropped.
    pub fn release(mut self) -> Result<(), SessionError> {
        self.release_interpreter().map_err(SessionError::Release)
    }

    fn release_interpreter(&mut self) -> Result<(), InterpreterError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.interpreter.release()
    }
}

impl<I: Interpreter> Drop for Session<I> {
    fn drop(&mut self) {
        if let Err(e) = self.release_interpreter() {
            log::warn!("Failed to release interpreter: {}", e);
        }
    }
}

impl<I: Interpreter + fmt::Debug> fmt::Debug for Session<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("interpreter", &self.interpreter)
            .field("verbose", &self.verbose)
            .field("progress_interval_ms", &self.progress_interval_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
