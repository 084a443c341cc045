// src/core/triage.rs

//! Turns the two output streams of a finished command into an [`Outcome`].
//!
//! The policy is fixed: any error item fails the command and the result stream is not
//! looked at; otherwise the command fails only if a rendered result item contains
//! [`FAILURE_MARKER`]. The marker match is case-sensitive and not anchored, so
//! "unfailed" or "Tests failed: 0" also count as failures.

use crate::{
    constants::{FAILURE_MARKER, MESSAGE_SEPARATOR},
    core::progress::ProgressSink,
    models::{OutputItem, Outcome, render_value},
};

/// Which stream decides the outcome. Chosen once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageState {
    /// The error stream is empty: result items decide.
    NoErrorStream,
    /// At least one error item: the command failed.
    HasErrorStream,
}

impl TriageState {
    /// Picks the state for an error stream.
    pub fn from_errors(errors: &[String]) -> Self {
        if errors.is_empty() {
            Self::NoErrorStream
        } else {
            Self::HasErrorStream
        }
    }
}

/// Decides the outcome of a finished command. When `verbose`, every item inspected is
/// echoed to `sink` in order.
pub fn triage(
    errors: &[String],
    results: &[OutputItem],
    verbose: bool,
    sink: &mut dyn ProgressSink,
) -> Outcome {
    match TriageState::from_errors(errors) {
        TriageState::HasErrorStream => {
            if verbose {
                for error in errors {
                    sink.report_item(error);
                }
            }
            Outcome::Failure {
                message: errors.join(MESSAGE_SEPARATOR),
            }
        }
        TriageState::NoErrorStream => triage_results(results, verbose, sink),
    }
}

fn triage_results(results: &[OutputItem], verbose: bool, sink: &mut dyn ProgressSink) -> Outcome {
    for value in results.iter().flatten() {
        let text = render_value(value);
        if verbose {
            sink.report_item(&text);
        }
        if text.contains(FAILURE_MARKER) {
            return Outcome::Failure {
                message: join_rendered(results),
            };
        }
    }
    Outcome::Success
}

/// `;`-joins every non-null result item, in order.
fn join_rendered(results: &[OutputItem]) -> String {
    results
        .iter()
        .flatten()
        .map(render_value)
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::{ProgressEvent, RecordingProgress, SilentProgress};
    use serde_json::json;

    fn items(texts: &[Option<&str>]) -> Vec<OutputItem> {
        texts.iter().map(|t| t.map(|s| json!(s))).collect()
    }

    #[test]
    fn test_failed_marker_fails_with_all_non_null_items() {
        let results = items(&[Some("step1 ok"), Some("step2 failed"), None]);
        let outcome = triage(&[], &results, false, &mut SilentProgress);
        assert_eq!(
            outcome,
            Outcome::Failure {
                message: "step1 ok;step2 failed".to_string()
            }
        );
    }

    #[test]
    fn test_clean_output_succeeds() {
        let results = items(&[Some("all good")]);
        assert_eq!(triage(&[], &results, false, &mut SilentProgress), Outcome::Success);
    }

    #[test]
    fn test_empty_streams_succeed() {
        assert_eq!(triage(&[], &[], true, &mut SilentProgress), Outcome::Success);
    }

    #[test]
    fn test_nulls_are_skipped_and_never_fault() {
        let results = items(&[None, None, Some("fine"), None]);
        assert_eq!(triage(&[], &results, true, &mut SilentProgress), Outcome::Success);
    }

    #[test]
    fn test_errors_dominate_result_stream() {
        let errors = vec!["disk full".to_string(), "retry later".to_string()];
        let results = items(&[Some("everything failed"), Some("ok")]);
        let outcome = triage(&errors, &results, false, &mut SilentProgress);
        assert_eq!(
            outcome,
            Outcome::Failure {
                message: "disk full;retry later".to_string()
            }
        );
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let results = items(&[Some("Build FAILED"), Some("Failed to warn")]);
        assert_eq!(triage(&[], &results, false, &mut SilentProgress), Outcome::Success);
    }

    #[test]
    fn test_marker_matches_inside_words() {
        let results = items(&[Some("unfailedness"), Some("later")]);
        assert_eq!(
            triage(&[], &results, false, &mut SilentProgress),
            Outcome::Failure {
                message: "unfailedness;later".to_string()
            }
        );
    }

    #[test]
    fn test_marker_in_non_string_values_is_detected() {
        let results = vec![Some(json!({"status": "failed"})), Some(json!(1))];
        assert_eq!(
            triage(&[], &results, false, &mut SilentProgress),
            Outcome::Failure {
                message: r#"{"status":"failed"};1"#.to_string()
            }
        );
    }

    #[test]
    fn test_verbose_echoes_errors_but_not_results() {
        let recorder = RecordingProgress::new();
        let errors = vec!["e1".to_string(), "e2".to_string()];
        let results = items(&[Some("out")]);
        triage(&errors, &results, true, &mut recorder.clone());
        assert_eq!(
            recorder.events(),
            vec![
                ProgressEvent::Item("e1".to_string()),
                ProgressEvent::Item("e2".to_string())
            ]
        );
    }

    #[test]
    fn test_verbose_echo_stops_at_first_failure() {
        let recorder = RecordingProgress::new();
        let results = items(&[Some("a"), None, Some("b failed"), Some("c")]);
        triage(&[], &results, true, &mut recorder.clone());
        assert_eq!(
            recorder.events(),
            vec![
                ProgressEvent::Item("a".to_string()),
                ProgressEvent::Item("b failed".to_string())
            ]
        );
    }

    #[test]
    fn test_quiet_triage_echoes_nothing() {
        let recorder = RecordingProgress::new();
        let results = items(&[Some("a"), Some("b")]);
        triage(&["x".to_string()], &results, false, &mut recorder.clone());
        triage(&[], &results, false, &mut recorder.clone());
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_triage_state_from_errors() {
        assert_eq!(TriageState::from_errors(&[]), TriageState::NoErrorStream);
        assert_eq!(
            TriageState::from_errors(&["e".to_string()]),
            TriageState::HasErrorStream
        );
    }
}
