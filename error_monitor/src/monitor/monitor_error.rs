// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! For more information on how these errors render, see
//! [miette](https://docs.rs/miette/latest/miette/index.html). Each variant has a stable
//! [diagnostic code] so test output can be grepped for the failure kind.
//!
//! [diagnostic code]: miette::Diagnostic::code

use std::fmt::Write as _;

use super::Checkpoint;
use crate::{DiagnosticRecord, MessagePattern, Severity};

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum MonitorError {
    /// An armed expectation was never matched before [`Checkpoint::VerifyFound`].
    /// Unexpected records from the same check are listed after the message.
    #[error(
        "Did not receive expected {severity} message '{pattern}' \
         ({unsatisfied} expectation(s) unsatisfied){}",
        render_transcript(.transcript, .unexpected_count)
    )]
    #[diagnostic(
        code(error_monitor::missing_expectation),
        help(
            "The operation under test returned without reporting this rule violation. \
             Check that the operation actually breaks the rule, and that the pattern \
             is spelled the way the message source reports it."
        )
    )]
    MissingExpectation {
        severity: Severity,
        pattern: MessagePattern,
        unsatisfied: usize,
        /// Unexpected records seen in the same check, including the ones that did not
        /// fit in the transcript.
        unexpected_count: usize,
        /// Unexpected records seen in the same check, for context.
        transcript: Vec<DiagnosticRecord>,
    },

    /// Error-like records that matched neither an expectation nor an allowance.
    #[error(
        "{checkpoint}: received {count} unexpected message(s), first: {first}{}",
        render_transcript(.transcript, .count)
    )]
    #[diagnostic(
        code(error_monitor::unexpected_error),
        help(
            "If this message is expected, register it with `expect()`. If it only \
             shows up on some drivers, register it with `allow()`."
        )
    )]
    UnexpectedErrors {
        checkpoint: Checkpoint,
        count: usize,
        first: DiagnosticRecord,
        transcript: Vec<DiagnosticRecord>,
    },

    /// The test driver closed a check in a way that does not fit how it was opened.
    #[error("{checkpoint}: {detail}")]
    #[diagnostic(code(error_monitor::protocol_violation))]
    ProtocolViolation {
        checkpoint: Checkpoint,
        detail: String,
    },
}

impl MonitorError {
    /// The unexpected records captured in the failed check, in delivery order.
    #[must_use]
    pub fn transcript(&self) -> &[DiagnosticRecord] {
        match self {
            MonitorError::MissingExpectation { transcript, .. }
            | MonitorError::UnexpectedErrors { transcript, .. } => transcript,
            MonitorError::ProtocolViolation { .. } => &[],
        }
    }
}

/// Lists every retained record on its own line, and says how many more were counted
/// but not retained. Empty when there is nothing to list.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn render_transcript(transcript: &[DiagnosticRecord], count: &usize) -> String {
    if transcript.is_empty() {
        return String::new();
    }

    let mut acc = String::from("\nunexpected message(s) in this check:");
    for (index, it) in transcript.iter().enumerate() {
        let _ = write!(acc, "\n  {}. {it}", index + 1);
    }
    let not_retained = count.saturating_sub(transcript.len());
    if not_retained > 0 {
        let _ = write!(acc, "\n  ... and {not_retained} more not retained");
    }
    acc
}

#[cfg(test)]
mod tests {
    use miette::Diagnostic;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_missing_expectation_names_the_pattern() {
        let it = MonitorError::MissingExpectation {
            severity: Severity::Error,
            pattern: "VUID-Image-01234".into(),
            unsatisfied: 2,
            unexpected_count: 0,
            transcript: vec![],
        };
        assert_eq!(
            it.to_string(),
            "Did not receive expected error message 'VUID-Image-01234' \
             (2 expectation(s) unsatisfied)"
        );
        assert_eq!(
            it.code().map(|it| it.to_string()),
            Some("error_monitor::missing_expectation".to_string())
        );
    }

    #[test]
    fn test_unexpected_errors_names_the_first_record() {
        let first = DiagnosticRecord::new(Severity::Error, "VUID-Memory-0042 leaked");
        let it = MonitorError::UnexpectedErrors {
            checkpoint: Checkpoint::VerifyNotFound,
            count: 1,
            first: first.clone(),
            transcript: vec![first],
        };
        assert_eq!(
            it.to_string(),
            "verify_not_found: received 1 unexpected message(s), first: \
             [error] VUID-Memory-0042 leaked\n\
             unexpected message(s) in this check:\n  \
             1. [error] VUID-Memory-0042 leaked"
        );
        assert_eq!(it.transcript().len(), 1);
    }

    #[test]
    fn test_every_retained_record_is_listed() {
        let a = DiagnosticRecord::new(Severity::Error, "VUID-AAA-1 first");
        let b = DiagnosticRecord::new(Severity::Error, "VUID-BBB-2 second");
        let it = MonitorError::UnexpectedErrors {
            checkpoint: Checkpoint::VerifyNotFound,
            count: 3,
            first: a.clone(),
            transcript: vec![a, b],
        };

        let rendered = it.to_string();
        assert!(rendered.contains("1. [error] VUID-AAA-1 first"), "{rendered}");
        assert!(rendered.contains("2. [error] VUID-BBB-2 second"), "{rendered}");
        assert!(rendered.contains("... and 1 more not retained"), "{rendered}");
    }

    #[test]
    fn test_missing_expectation_lists_unexpected_records() {
        let it = MonitorError::MissingExpectation {
            severity: Severity::Error,
            pattern: "X-001".into(),
            unsatisfied: 1,
            unexpected_count: 1,
            transcript: vec![DiagnosticRecord::new(Severity::Error, "VUID-ZZZ-9 unrelated")],
        };
        assert_eq!(
            it.to_string(),
            "Did not receive expected error message 'X-001' (1 expectation(s) \
             unsatisfied)\nunexpected message(s) in this check:\n  \
             1. [error] VUID-ZZZ-9 unrelated"
        );
    }
}
