// src/system/shell.rs

//! Persistent shell interpreter.
//!
//! A single shell process lives for the whole session, so variables and directory
//! changes made by one command are visible to the next. Commands are written to the
//! shell's stdin as a quoted `eval` argument, framed by a begin and an end marker
//! echoed on stdout and stderr. Two reader threads drain the pipes, drop anything
//! written before the begin marker, and flag completion once both end markers come back.

use crate::{
    core::paths,
    models::{OutputItem, ShellConfig},
    system::interpreter::{Completion, Interpreter, InterpreterError},
};
use std::{
    io::{self, BufRead, BufReader, ErrorKind, Read, Write},
    process::{Child, ChildStdin, Command, Stdio},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread,
};
use uuid::Uuid;

// --- Captured Output ---

#[derive(Debug, Default)]
struct PipeBuffer {
    lines: Vec<String>,
    started: bool,
    marker_seen: bool,
    closed: bool,
}

impl PipeBuffer {
    /// Nothing more will arrive for the current submission.
    fn is_settled(&self) -> bool {
        self.marker_seen || self.closed
    }
}

/// Begin and end lines framing one submission.
#[derive(Debug, Clone)]
struct Markers {
    begin: String,
    end: String,
}

impl Markers {
    fn fresh() -> Self {
        let id = Uuid::new_v4().simple();
        Self {
            begin: format!("__ISHELL_BEGIN_{}__", id),
            end: format!("__ISHELL_DONE_{}__", id),
        }
    }
}

#[derive(Debug, Default)]
struct Capture {
    markers: Option<Markers>,
    stdout: PipeBuffer,
    stderr: PipeBuffer,
}

impl Capture {
    /// Forgets the output of the previous submission. Pipe closure survives the reset.
    fn reset(&mut self) {
        self.markers = None;
        for buffer in [&mut self.stdout, &mut self.stderr] {
            buffer.lines.clear();
            buffer.started = false;
            buffer.marker_seen = false;
        }
    }
}

type SharedCapture = Arc<Mutex<Capture>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

impl Pipe {
    fn name(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }

    fn buffer(self, capture: &mut Capture) -> &mut PipeBuffer {
        match self {
            Self::Stdout => &mut capture.stdout,
            Self::Stderr => &mut capture.stderr,
        }
    }
}

/// Reads `reader` line by line into the shared capture until EOF.
fn pump(reader: impl Read, pipe: Pipe, capture: SharedCapture) {
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&raw);
                let line = text.trim_end_matches(['\n', '\r']);

                let mut guard = lock(&capture);
                let Some(markers) = guard.markers.clone() else {
                    log::trace!("Dropping shell {} line outside a submission.", pipe.name());
                    continue;
                };
                let buffer = pipe.buffer(&mut guard);
                if !buffer.started {
                    // Leftovers of earlier background jobs come before the begin marker.
                    if line.ends_with(&markers.begin) {
                        buffer.started = true;
                    } else {
                        log::trace!("Dropping stale shell {} line.", pipe.name());
                    }
                    continue;
                }
                // Output without a trailing newline ends up on the marker's line.
                match line.strip_suffix(&markers.end) {
                    Some(prefix) => {
                        if !prefix.is_empty() {
                            buffer.lines.push(prefix.to_string());
                        }
                        buffer.marker_seen = true;
                    }
                    None => buffer.lines.push(line.to_string()),
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("Reading shell {} failed: {}", pipe.name(), e);
                break;
            }
        }
    }
    log::trace!("Shell {} reached EOF.", pipe.name());
    pipe.buffer(&mut lock(&capture)).closed = true;
}

fn spawn_reader(
    reader: impl Read + Send + 'static,
    pipe: Pipe,
    capture: &SharedCapture,
) -> io::Result<()> {
    let capture = Arc::clone(capture);
    // Readers are detached: a background job started by a command may keep the pipe
    // open long after the shell itself is gone.
    thread::Builder::new()
        .name(format!("ishell-{}", pipe.name()))
        .spawn(move || pump(reader, pipe, capture))
        .map(|_| ())
}

/// Quotes `text` as a single POSIX shell word.
fn single_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Wraps a command so its start and completion can be detected on both pipes.
///
/// The command is parsed by `eval` on its own, so an unterminated quote or heredoc
/// becomes a syntax error on stderr instead of swallowing the end markers.
/// `command` keeps a syntax error from exiting a POSIX shell.
fn wrap_script(script: &str, markers: &Markers) -> String {
    let Markers { begin, end } = markers;
    format!(
        "printf '%s\\n' '{begin}'\nprintf '%s\\n' '{begin}' >&2\n\
         command eval {} </dev/null\n\
         printf '%s\\n' '{end}'\nprintf '%s\\n' '{end}' >&2\n",
        single_quote(script)
    )
}

// --- Process Management ---

#[cfg(unix)]
fn kill_process_tree(child: &mut Child) -> Result<(), InterpreterError> {
    use nix::{
        errno::Errno,
        sys::signal::{Signal, killpg},
        unistd::Pid,
    };

    let pid = i32::try_from(child.id())
        .map_err(|_| InterpreterError::Engine(format!("PID {} is out of range", child.id())))?;
    // The shell leads its own process group, which also holds whatever it started.
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(InterpreterError::Io(io::Error::from(e))),
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) -> Result<(), InterpreterError> {
    child.kill()?;
    Ok(())
}

fn stop_child(child: &Mutex<Child>) -> Result<(), InterpreterError> {
    let mut child = lock(child);
    log::debug!("Killing shell process (PID: {})...", child.id());
    kill_process_tree(&mut child)?;
    child.wait()?;
    Ok(())
}

#[derive(Debug)]
struct ShellProcess {
    child: Arc<Mutex<Child>>,
    stdin: ChildStdin,
    capture: SharedCapture,
}

impl ShellProcess {
    fn spawn(config: &ShellConfig) -> Result<Self, InterpreterError> {
        let program = config.program.display().to_string();

        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &config.working_dir {
            let expanded = paths::expand_path(dir).map_err(|e| InterpreterError::Spawn {
                program: program.clone(),
                source: io::Error::new(ErrorKind::InvalidInput, e.to_string()),
            })?;
            command.current_dir(dunce::simplified(&expanded));
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn().map_err(|source| InterpreterError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Until every pipe is wired up, a failure must not leave the shell running.
        let mut child = scopeguard::guard(child, |mut child| {
            let _ = kill_process_tree(&mut child);
            let _ = child.wait();
        });

        let stdin = child
            .stdin
            .take()
            .ok_or(InterpreterError::PipeUnavailable("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(InterpreterError::PipeUnavailable("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(InterpreterError::PipeUnavailable("stderr"))?;

        let capture = SharedCapture::default();
        spawn_reader(stdout, Pipe::Stdout, &capture)?;
        spawn_reader(stderr, Pipe::Stderr, &capture)?;

        let child = scopeguard::ScopeGuard::into_inner(child);
        log::debug!("Shell '{}' started (PID: {}).", program, child.id());

        Ok(Self {
            child: Arc::new(Mutex::new(child)),
            stdin,
            capture,
        })
    }

    fn is_alive(&self) -> Result<bool, InterpreterError> {
        Ok(lock(&self.child).try_wait()?.is_none())
    }

    fn terminate(self) -> Result<(), InterpreterError> {
        if !self.is_alive()? {
            return Ok(());
        }
        drop(self.stdin);
        stop_child(&self.child)
    }
}

// --- Public Interpreter ---

/// Completion handle for a command submitted to a [`ShellInterpreter`].
#[derive(Debug)]
pub struct ShellCompletion {
    child: Arc<Mutex<Child>>,
    capture: SharedCapture,
}

impl Completion for ShellCompletion {
    fn is_finished(&mut self) -> Result<bool, InterpreterError> {
        let capture = lock(&self.capture);
        Ok(capture.stdout.is_settled() && capture.stderr.is_settled())
    }

    /// Kills the whole shell. The interpreter starts a fresh one on the next submission,
    /// so shell state (variables, working directory) does not survive a forced stop.
    fn force_stop(&mut self) -> Result<(), InterpreterError> {
        stop_child(&self.child)
    }
}

/// An [`Interpreter`] backed by a long-lived POSIX shell process.
///
/// Result items are the command's stdout lines (blank lines are reported as `None`);
/// error items are its non-blank stderr lines.
///
/// Output a background job (`cmd &`) writes before the next command starts is dropped.
/// Output it writes while a later command runs shares that command's pipes and is
/// attributed to it.
#[derive(Debug)]
pub struct ShellInterpreter {
    config: ShellConfig,
    process: Option<ShellProcess>,
    released: bool,
}

impl ShellInterpreter {
    /// Starts the shell described by `config`.
    pub fn spawn(config: ShellConfig) -> Result<Self, InterpreterError> {
        let process = ShellProcess::spawn(&config)?;
        Ok(Self {
            config,
            process: Some(process),
            released: false,
        })
    }

    /// Starts the default shell (`bash` when available, `sh` otherwise).
    pub fn spawn_default() -> Result<Self, InterpreterError> {
        Self::spawn(ShellConfig::default())
    }

    fn process(&self) -> Result<&ShellProcess, InterpreterError> {
        if self.released {
            return Err(InterpreterError::Released);
        }
        self.process.as_ref().ok_or(InterpreterError::Released)
    }
}

impl Interpreter for ShellInterpreter {
    type Completion = ShellCompletion;

    fn clear_pending(&mut self) -> Result<(), InterpreterError> {
        if self.released {
            return Err(InterpreterError::Released);
        }

        let alive = match &self.process {
            Some(process) => process.is_alive()?,
            None => false,
        };
        if !alive {
            if let Some(stale) = self.process.take() {
                stale.terminate()?;
            }
            log::debug!("Shell process is gone, starting a new one.");
            self.process = Some(ShellProcess::spawn(&self.config)?);
        }

        lock(&self.process()?.capture).reset();
        Ok(())
    }

    fn submit(&mut self, script: &str) -> Result<Self::Completion, InterpreterError> {
        if self.released {
            return Err(InterpreterError::Released);
        }
        let process = self.process.as_mut().ok_or(InterpreterError::Released)?;

        let markers = Markers::fresh();
        let wrapped = wrap_script(script, &markers);
        lock(&process.capture).markers = Some(markers);

        log::trace!("Submitting script to shell: {}", script);
        process.stdin.write_all(wrapped.as_bytes())?;
        process.stdin.flush()?;

        Ok(ShellCompletion {
            child: Arc::clone(&process.child),
            capture: Arc::clone(&process.capture),
        })
    }

    fn error_stream(&self) -> Result<Vec<String>, InterpreterError> {
        let capture = lock(&self.process()?.capture);
        Ok(capture
            .stderr
            .lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .cloned()
            .collect())
    }

    fn result_stream(&self) -> Result<Vec<OutputItem>, InterpreterError> {
        let capture = lock(&self.process()?.capture);
        Ok(capture
            .stdout
            .lines
            .iter()
            .map(|line| {
                if line.trim().is_empty() {
                    None
                } else {
                    Some(serde_json::Value::String(line.clone()))
                }
            })
            .collect())
    }

    fn release(&mut self) -> Result<(), InterpreterError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        if let Some(process) = self.process.take() {
            process.terminate()?;
        }
        log::debug!("Shell interpreter released.");
        Ok(())
    }
}

impl Drop for ShellInterpreter {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Failed to release shell interpreter: {}", e);
        }
    }
}
