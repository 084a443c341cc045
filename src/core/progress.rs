// src/core/progress.rs

//! Progress notifications emitted while a command runs.

use colored::Colorize;
use std::sync::{Arc, Mutex, PoisonError};

/// Observer of a running command.
///
/// Notifications are best effort: a sink cannot fail and never influences the
/// outcome of a command.
pub trait ProgressSink {
    /// The command is still running after `elapsed_secs` seconds.
    fn report(&mut self, elapsed_secs: u64);

    /// An output or error item discovered while triaging (verbose sessions only).
    fn report_item(&mut self, text: &str);
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn report(&mut self, _elapsed_secs: u64) {}

    fn report_item(&mut self, _text: &str) {}
}

/// Prints notifications to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&mut self, elapsed_secs: u64) {
        println!("{}", format!("Command run for {}s", elapsed_secs).dimmed());
    }

    fn report_item(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Forwards notifications to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&mut self, elapsed_secs: u64) {
        log::info!("Command run for {}s", elapsed_secs);
    }

    fn report_item(&mut self, text: &str) {
        log::info!("{}", text);
    }
}

/// A notification kept by [`RecordingProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A `report` call, in elapsed seconds.
    Elapsed(u64),
    /// A `report_item` call.
    Item(String),
}

/// Keeps every notification in memory. Clones share the same event list.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingProgress {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification received so far, in order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&mut self, elapsed_secs: u64) {
        self.push(ProgressEvent::Elapsed(elapsed_secs));
    }

    fn report_item(&mut self, text: &str) {
        self.push(ProgressEvent::Item(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_clones_share_events() {
        let recorder = RecordingProgress::new();
        let mut sink: Box<dyn ProgressSink> = Box::new(recorder.clone());
        sink.report(3);
        sink.report_item("hello");
        assert_eq!(
            recorder.events(),
            vec![
                ProgressEvent::Elapsed(3),
                ProgressEvent::Item("hello".to_string())
            ]
        );
    }
}
