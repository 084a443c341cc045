//! Scripted interpreter.
//!
//! `ScriptedInterpreter` plays back pre-recorded runs instead of executing anything,
//! and keeps a journal of every call it receives. Sessions built on it are fully
//! deterministic, which is what the session tests rely on.

use crate::{
    models::OutputItem,
    system::interpreter::{Completion, Interpreter, InterpreterError},
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Where a scripted run raises an engine fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// `clear_pending` fails.
    ClearPending,
    /// `submit` fails.
    Submit,
    /// `is_finished` fails.
    Poll,
    /// `force_stop` fails.
    ForceStop,
    /// `error_stream` and `result_stream` fail.
    ReadStreams,
}

/// One pre-recorded command execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptedRun {
    /// Number of unfinished polls before the run completes. `None` never completes.
    pub polls_until_finished: Option<u32>,
    /// Error stream of the run.
    pub errors: Vec<String>,
    /// Result stream of the run.
    pub results: Vec<OutputItem>,
    /// Where the run faults, if anywhere.
    pub fault: Option<FaultPoint>,
}

impl ScriptedRun {
    /// A run that is already finished at the first poll and produced `results`.
    pub fn finished(results: Vec<OutputItem>) -> Self {
        Self {
            polls_until_finished: Some(0),
            results,
            ..Default::default()
        }
    }

    /// A run that never finishes on its own.
    pub fn hanging() -> Self {
        Self {
            polls_until_finished: None,
            ..Default::default()
        }
    }

    /// Sets the error stream.
    pub fn with_errors(mut self, errors: &[&str]) -> Self {
        self.errors = errors.iter().map(|e| (*e).to_string()).collect();
        self
    }

    /// Finishes after `polls` unfinished polls.
    pub fn after_polls(mut self, polls: u32) -> Self {
        self.polls_until_finished = Some(polls);
        self
    }

    /// Raises an engine fault at `fault`.
    pub fn failing_at(mut self, fault: FaultPoint) -> Self {
        self.fault = Some(fault);
        self
    }

    fn faults_at(&self, point: FaultPoint) -> bool {
        self.fault == Some(point)
    }
}

/// Everything a [`ScriptedInterpreter`] was asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    /// Submitted scripts, in order.
    pub submitted: Vec<String>,
    /// `clear_pending` calls.
    pub clears: usize,
    /// `is_finished` calls.
    pub polls: usize,
    /// `force_stop` calls.
    pub force_stops: usize,
    /// `release` calls.
    pub releases: usize,
}

/// Shared view on a [`ScriptedInterpreter`]'s journal, usable after the
/// interpreter has been moved into a session.
#[derive(Debug, Clone, Default)]
pub struct JournalHandle(Arc<Mutex<Journal>>);

impl JournalHandle {
    fn lock(&self) -> MutexGuard<'_, Journal> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the journal as it is now.
    pub fn snapshot(&self) -> Journal {
        self.lock().clone()
    }
}

fn fault(point: FaultPoint) -> InterpreterError {
    InterpreterError::Engine(format!("scripted fault at {:?}", point))
}

/// An [`Interpreter`] replaying [`ScriptedRun`]s.
#[derive(Debug, Default)]
pub struct ScriptedInterpreter {
    queue: VecDeque<ScriptedRun>,
    current: ScriptedRun,
    journal: JournalHandle,
}

impl ScriptedInterpreter {
    /// Creates an interpreter that plays `runs` in order. Submissions beyond the
    /// recorded runs finish immediately without output.
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            queue: runs.into(),
            ..Default::default()
        }
    }

    /// A handle on the journal that outlives moving the interpreter.
    pub fn journal(&self) -> JournalHandle {
        self.journal.clone()
    }
}

/// Completion handle of a [`ScriptedRun`].
#[derive(Debug)]
pub struct ScriptedCompletion {
    remaining_polls: Option<u32>,
    fault: Option<FaultPoint>,
    journal: JournalHandle,
}

impl Completion for ScriptedCompletion {
    fn is_finished(&mut self) -> Result<bool, InterpreterError> {
        self.journal.lock().polls += 1;
        if self.fault == Some(FaultPoint::Poll) {
            return Err(fault(FaultPoint::Poll));
        }
        match self.remaining_polls {
            None => Ok(false),
            Some(0) => Ok(true),
            Some(n) => {
                self.remaining_polls = Some(n - 1);
                Ok(false)
            }
        }
    }

    fn force_stop(&mut self) -> Result<(), InterpreterError> {
        self.journal.lock().force_stops += 1;
        if self.fault == Some(FaultPoint::ForceStop) {
            return Err(fault(FaultPoint::ForceStop));
        }
        Ok(())
    }
}

impl Interpreter for ScriptedInterpreter {
    type Completion = ScriptedCompletion;

    fn clear_pending(&mut self) -> Result<(), InterpreterError> {
        self.journal.lock().clears += 1;
        self.current = self
            .queue
            .pop_front()
            .unwrap_or_else(|| ScriptedRun::finished(Vec::new()));
        if self.current.faults_at(FaultPoint::ClearPending) {
            return Err(fault(FaultPoint::ClearPending));
        }
        Ok(())
    }

    fn submit(&mut self, script: &str) -> Result<Self::Completion, InterpreterError> {
        self.journal.lock().submitted.push(script.to_string());
        if self.current.faults_at(FaultPoint::Submit) {
            return Err(fault(FaultPoint::Submit));
        }
        Ok(ScriptedCompletion {
            remaining_polls: self.current.polls_until_finished,
            fault: self.current.fault,
            journal: self.journal.clone(),
        })
    }

    fn error_stream(&self) -> Result<Vec<String>, InterpreterError> {
        if self.current.faults_at(FaultPoint::ReadStreams) {
            return Err(fault(FaultPoint::ReadStreams));
        }
        Ok(self.current.errors.clone())
    }

    fn result_stream(&self) -> Result<Vec<OutputItem>, InterpreterError> {
        if self.current.faults_at(FaultPoint::ReadStreams) {
            return Err(fault(FaultPoint::ReadStreams));
        }
        Ok(self.current.results.clone())
    }

    fn release(&mut self) -> Result<(), InterpreterError> {
        self.journal.lock().releases += 1;
        Ok(())
    }
}
