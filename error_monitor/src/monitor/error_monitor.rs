// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The expectation oracle. A test registers what it expects (or tolerates), runs exactly
//! one operation against the system under test, and then asks for a verdict:
//!
//! ```
//! use conformance_error_monitor::{ErrorMonitor, Severity};
//!
//! let monitor = ErrorMonitor::default();
//!
//! // Arm.
//! monitor.expect(Severity::Error, "VUID-BufferCreateInfo-size-00912");
//!
//! // The message source reports through the monitor's ingress (normally a callback
//! // registered with the system under test).
//! monitor.report(
//!     Severity::Error,
//!     "Validation Error: [ VUID-BufferCreateInfo-size-00912 ] size is 0",
//! );
//!
//! // Disarm and judge.
//! assert!(monitor.verify_found().is_ok());
//! ```
//!
//! The monitor is a cheap handle (it wraps an [`Arc`]), so the same instance can be
//! captured by a callback that runs on a driver thread while the test thread arms and
//! judges it. All state lives behind one lock:
//! - Registrations never observe a half updated list.
//! - A record that arrives mid checkpoint is either judged by that checkpoint or by the
//!   next one, never lost.
//!
//! Failures are never raised from inside [`ErrorMonitor::on_diagnostic`]. They are
//! buffered and decided at the next checkpoint.

use std::sync::{Arc, MutexGuard, PoisonError,
                atomic::{AtomicBool, Ordering}};

use super::{Checkpoint, Classification, DrainedCheck, MonitorConfig, MonitorError,
            MonitorPhase, MonitorState, MonitorStats, UnexpectedErrorPolicy, Verdict};
use crate::{DiagnosticRecord, MessagePattern, Severity, SeverityMask, StdMutex};

/// What the message source should do after a record was delivered. A validation layer
/// uses [`CallbackAction::SkipCall`] to avoid passing a call it just flagged down to the
/// driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Continue,
    SkipCall,
}

/// You can safely clone this struct, since it only contains [`Arc`]s. Clones share the
/// same expectations, allowances, and transcript.
#[derive(Debug, Clone)]
pub struct ErrorMonitor {
    inner: Arc<StdMutex<MonitorState>>,
    bailout: Arc<AtomicBool>,
}

impl Default for ErrorMonitor {
    fn default() -> Self { Self::new(MonitorConfig::default()) }
}

impl ErrorMonitor {
    pub fn new(config: impl Into<MonitorConfig>) -> Self {
        Self {
            inner: Arc::new(StdMutex::new(MonitorState::new(config.into()))),
            bailout: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A test thread that panics (eg: a failed assert) can poison the lock. The state is
    /// still consistent since no mutation in [`MonitorState`] can panic half way, so the
    /// guard is recovered rather than propagating the panic into a driver callback.
    fn lock_state(&self) -> MutexGuard<'_, MonitorState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn config(&self) -> MonitorConfig { self.lock_state().config }

    /// Register a message that must be reported before the next
    /// [`ErrorMonitor::verify_found`]. Registering the same pattern twice requires two
    /// matching records. Can be called while the operation under test is running.
    pub fn expect(&self, severity: Severity, pattern: impl Into<MessagePattern>) {
        let pattern = pattern.into();
        tracing::debug!(
            message = "🎯 expect",
            severity = %severity,
            pattern = %pattern
        );
        self.lock_state().push_expectation(severity, pattern);
    }

    /// Same as calling [`ErrorMonitor::expect`] `count` times.
    pub fn expect_n(
        &self,
        severity: Severity,
        pattern: impl Into<MessagePattern>,
        count: usize,
    ) {
        let pattern = pattern.into();
        tracing::debug!(
            message = "🎯 expect",
            severity = %severity,
            pattern = %pattern,
            count = count
        );
        let mut state = self.lock_state();
        for _ in 0..count {
            state.push_expectation(severity, pattern.clone());
        }
    }

    /// Register a message that may or may not be reported, any number of times, without
    /// affecting the verdict. Cleared at the next checkpoint.
    pub fn allow(&self, severity: Severity, pattern: impl Into<MessagePattern>) {
        let pattern = pattern.into();
        tracing::debug!(
            message = "🙈 allow",
            severity = %severity,
            pattern = %pattern
        );
        self.lock_state().push_allowance(severity, pattern);
    }

    /// Drop matching messages for the rest of the session. Unlike
    /// [`ErrorMonitor::allow`] this is not cleared by checkpoints, and it runs before
    /// expectations are considered.
    pub fn ignore(&self, severity: Severity, pattern: impl Into<MessagePattern>) {
        let pattern = pattern.into();
        tracing::debug!(
            message = "🔇 ignore",
            severity = %severity,
            pattern = %pattern
        );
        self.lock_state().push_ignored(severity, pattern);
    }

    pub fn clear_ignored(&self) { self.lock_state().ignored.clear(); }

    /// Open a success window that judges the configured severities. Stale unexpected
    /// records from before this call are discarded.
    pub fn expect_success(&self) {
        let judged = self.lock_state().config.judged;
        self.expect_success_for(judged);
    }

    /// Open a success window that judges `judged` instead of the configured severities,
    /// eg: errors and warnings. The configured mask is restored at the next checkpoint.
    pub fn expect_success_for(&self, judged: impl Into<SeverityMask>) {
        let judged = judged.into();
        tracing::debug!(message = "👀 expect success", judged = ?judged);
        self.lock_state().begin_watching(judged);
    }

    /// Ingress for the message source. Safe to call from any thread, at any time,
    /// including when nothing is armed.
    pub fn on_diagnostic(&self, record: &DiagnosticRecord) -> CallbackAction {
        // Log only after the guard is dropped: the tracing bridge may deliver a record
        // back into this method from inside the log call.
        // The bailout flag is set under the guard so a concurrent checkpoint either sees
        // both the satisfied entry and the flag, or neither.
        let (classification, phase) = {
            let mut state = self.lock_state();
            let classification = state.classify(record);
            if matches!(classification, Classification::Satisfied { .. }) {
                self.bailout.store(true, Ordering::Release);
            }
            (classification, state.phase)
        };

        match classification {
            Classification::Satisfied { index } => {
                tracing::debug!(
                    message = "✅ expected message received",
                    record = %record,
                    entry = index
                );
                CallbackAction::SkipCall
            }
            Classification::Allowed => {
                tracing::debug!(message = "🙈 allowed message received", record = %record);
                CallbackAction::Continue
            }
            Classification::Ignored => CallbackAction::Continue,
            Classification::Unexpected => {
                tracing::warn!(
                    message = "❌ unexpected message received",
                    record = %record,
                    phase = %phase
                );
                CallbackAction::Continue
            }
            Classification::Note => {
                tracing::trace!(message = "📝 note", record = %record);
                CallbackAction::Continue
            }
        }
    }

    /// Convenience wrapper around [`ErrorMonitor::on_diagnostic`] for sources that only
    /// have a severity and some text.
    pub fn report(&self, severity: Severity, text: &str) -> CallbackAction {
        self.on_diagnostic(&DiagnosticRecord::new(severity, text))
    }

    /// The "this must have happened" checkpoint. Every registered expectation must have
    /// been satisfied. Expectations and allowances are cleared whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::MissingExpectation`] naming the first unsatisfied pattern.
    /// - [`MonitorError::UnexpectedErrors`] if unmatched error-like records were seen
    ///   and the policy is [`UnexpectedErrorPolicy::FailCheckpoint`].
    #[tracing::instrument(skip(self))]
    pub fn verify_found(&self) -> Result<Verdict, MonitorError> {
        let (drained, policy) = {
            let mut state = self.lock_state();
            let drained = self.drain_locked(&mut state);
            (drained, state.config.unexpected_policy)
        };

        let mut unsatisfied = drained.expectations.iter().filter(|it| !it.satisfied);
        if let Some(first) = unsatisfied.next() {
            return Err(MonitorError::MissingExpectation {
                severity: first.severity,
                pattern: first.pattern.clone(),
                unsatisfied: 1 + unsatisfied.count(),
                unexpected_count: drained.unexpected_count,
                transcript: drained.unexpected,
            });
        }

        let satisfied = drained.expectations.len();
        if satisfied == 0 {
            tracing::debug!(message = "verify_found called with nothing armed");
        }

        match (drained.unexpected.first().cloned(), policy) {
            (Some(first), UnexpectedErrorPolicy::FailCheckpoint) => {
                Err(MonitorError::UnexpectedErrors {
                    checkpoint: Checkpoint::VerifyFound,
                    count: drained.unexpected_count,
                    first,
                    transcript: drained.unexpected,
                })
            }
            (Some(_), UnexpectedErrorPolicy::ReportOnly) => {
                for it in &drained.unexpected {
                    tracing::warn!(message = "⚠️ tolerated unexpected message", record = %it);
                }
                Ok(Verdict {
                    checkpoint: Checkpoint::VerifyFound,
                    satisfied,
                    unexpected: drained.unexpected,
                    notes: drained.notes,
                })
            }
            (None, _) => Ok(Verdict {
                checkpoint: Checkpoint::VerifyFound,
                satisfied,
                unexpected: vec![],
                notes: drained.notes,
            }),
        }
    }

    /// The "this must not have happened" checkpoint, used after an operation that is
    /// expected to succeed cleanly. Allowances and the transcript are cleared whatever
    /// the outcome.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::ProtocolViolation`] if expectations were armed.
    /// - [`MonitorError::UnexpectedErrors`] if any unmatched error-like record was seen
    ///   since [`ErrorMonitor::expect_success`] (or the last checkpoint).
    #[tracing::instrument(skip(self))]
    pub fn verify_not_found(&self) -> Result<Verdict, MonitorError> {
        let drained = {
            let mut state = self.lock_state();
            self.drain_locked(&mut state)
        };

        if !drained.expectations.is_empty() {
            return Err(MonitorError::ProtocolViolation {
                checkpoint: Checkpoint::VerifyNotFound,
                detail: format!(
                    "{} expectation(s) were armed, use verify_found to judge them",
                    drained.expectations.len()
                ),
            });
        }

        if drained.phase != MonitorPhase::Watching {
            tracing::debug!(
                message = "verify_not_found without expect_success",
                phase = %drained.phase
            );
        }

        match drained.unexpected.first().cloned() {
            Some(first) => Err(MonitorError::UnexpectedErrors {
                checkpoint: Checkpoint::VerifyNotFound,
                count: drained.unexpected_count,
                first,
                transcript: drained.unexpected,
            }),
            None => Ok(Verdict {
                checkpoint: Checkpoint::VerifyNotFound,
                satisfied: 0,
                unexpected: vec![],
                notes: drained.notes,
            }),
        }
    }

    /// [`ErrorMonitor::verify_found`] with assertion semantics, for test bodies.
    ///
    /// # Panics
    ///
    /// With the rendered report if the checkpoint failed.
    #[track_caller]
    pub fn assert_found(&self) -> Verdict {
        self.verify_found()
            .unwrap_or_else(|err| panic_with_report(err))
    }

    /// [`ErrorMonitor::verify_not_found`] with assertion semantics, for test bodies.
    ///
    /// # Panics
    ///
    /// With the rendered report if the checkpoint failed.
    #[track_caller]
    pub fn assert_not_found(&self) -> Verdict {
        self.verify_not_found()
            .unwrap_or_else(|err| panic_with_report(err))
    }

    /// Throw away the current check without judging it. The ignore list is kept.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        let _ = self.drain_locked(&mut state);
    }

    /// The bailout flag is cleared under the same guard as the drain, so a record that
    /// satisfies the next check (armed from another thread) can't have its flag wiped.
    fn drain_locked(&self, state: &mut MonitorState) -> DrainedCheck {
        self.bailout.store(false, Ordering::Release);
        state.drain_check()
    }

    #[must_use]
    pub fn phase(&self) -> MonitorPhase { self.lock_state().phase }

    /// Number of armed expectations that are not satisfied yet.
    #[must_use]
    pub fn outstanding(&self) -> usize { self.lock_state().outstanding() }

    /// Copy of the unexpected records seen in the current check.
    #[must_use]
    pub fn unexpected_transcript(&self) -> Vec<DiagnosticRecord> {
        self.lock_state().unexpected.iter().cloned().collect()
    }

    #[must_use]
    pub fn notes(&self) -> Vec<DiagnosticRecord> {
        self.lock_state().notes.iter().cloned().collect()
    }

    #[must_use]
    pub fn stats(&self) -> MonitorStats { self.lock_state().stats }

    /// Set as soon as a record satisfies an expectation, cleared at every checkpoint.
    /// Test drivers can poll it to skip follow-on work once the violation fired.
    #[must_use]
    pub fn bailout_flag(&self) -> Arc<AtomicBool> { self.bailout.clone() }
}

/// The plain message goes first, so it survives a report handler that wraps or styles
/// its output.
#[track_caller]
fn panic_with_report(err: MonitorError) -> ! {
    let message = err.to_string();
    panic!("{message}\n{:?}", miette::Report::new(err))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_scenario_expected_message_found() {
        let monitor = ErrorMonitor::default();
        monitor.expect(Severity::Error, "X-001");
        assert_eq!(monitor.phase(), MonitorPhase::Armed);

        let action = monitor.report(Severity::Error, "Validation Error: X-001");
        assert_eq!(action, CallbackAction::SkipCall);

        let verdict = monitor.verify_found().unwrap();
        assert_eq!(verdict.satisfied, 1);
        assert!(verdict.is_clean());
        assert_eq!(monitor.phase(), MonitorPhase::Idle);
    }

    #[test]
    fn test_scenario_expected_message_missing() {
        let monitor = ErrorMonitor::default();
        monitor.expect(Severity::Error, "X-001");

        let err = monitor.verify_found().unwrap_err();
        match err {
            MonitorError::MissingExpectation {
                severity,
                pattern,
                unsatisfied,
                ..
            } => {
                assert_eq!(severity, Severity::Error);
                assert_eq!(pattern, MessagePattern::from("X-001"));
                assert_eq!(unsatisfied, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(monitor.outstanding(), 0);
    }

    #[test]
    fn test_unexpected_error_fails_verify_found_by_default() {
        let monitor = ErrorMonitor::default();
        monitor.expect(Severity::Error, "X-001");
        monitor.report(Severity::Error, "X-001");
        monitor.report(Severity::Error, "Z-999 something else");

        let err = monitor.verify_found().unwrap_err();
        assert!(matches!(
            err,
            MonitorError::UnexpectedErrors {
                checkpoint: Checkpoint::VerifyFound,
                count: 1,
                ..
            }
        ));
        assert_eq!(err.transcript()[0].text, "Z-999 something else");
    }

    #[test]
    fn test_unexpected_error_is_tolerated_with_report_only() {
        let monitor = ErrorMonitor::new(UnexpectedErrorPolicy::ReportOnly);
        monitor.expect(Severity::Error, "X-001");
        monitor.report(Severity::Error, "X-001");
        monitor.report(Severity::Error, "Z-999");

        let verdict = monitor.verify_found().unwrap();
        assert!(!verdict.is_clean());
        assert_eq!(verdict.unexpected[0].text, "Z-999");

        // Still fatal on the success path.
        monitor.expect_success();
        monitor.report(Severity::Error, "Z-999");
        assert!(monitor.verify_not_found().is_err());
    }

    #[test]
    fn test_verify_not_found_with_armed_expectation_is_protocol_violation() {
        let monitor = ErrorMonitor::default();
        monitor.expect(Severity::Error, "X-001");
        monitor.expect_success();

        let err = monitor.verify_not_found().unwrap_err();
        assert!(matches!(err, MonitorError::ProtocolViolation { .. }));
        assert_eq!(monitor.outstanding(), 0);
        assert_eq!(monitor.phase(), MonitorPhase::Idle);
    }

    #[test]
    fn test_bailout_flag_follows_satisfaction() {
        let monitor = ErrorMonitor::default();
        let bailout = monitor.bailout_flag();
        monitor.expect(Severity::Error, "X-001");
        assert!(!bailout.load(Ordering::Acquire));

        monitor.report(Severity::Error, "X-001");
        assert!(bailout.load(Ordering::Acquire));

        let _ = monitor.verify_found();
        assert!(!bailout.load(Ordering::Acquire));
    }

    #[test]
    fn test_bailout_flag_agrees_with_state_under_concurrent_checkpoints() {
        const ROUNDS: usize = 2_000;

        let monitor = ErrorMonitor::default();
        let bailout = monitor.bailout_flag();
        let done = Arc::new(AtomicBool::new(false));

        let arming = {
            let monitor = monitor.clone();
            std::thread::spawn(move || {
                for _ in 0..ROUNDS {
                    monitor.expect(Severity::Error, "X-001");
                    let _ = monitor.report(Severity::Error, "X-001");
                }
            })
        };
        let judging = {
            let monitor = monitor.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let _ = monitor.verify_found();
                }
            })
        };

        // The flag is only ever written under the state lock, so a reader holding the
        // lock must see it agree with the entries.
        while !arming.is_finished() {
            let state = monitor.lock_state();
            let any_satisfied = state.expectations.iter().any(|it| it.satisfied);
            assert_eq!(bailout.load(Ordering::Acquire), any_satisfied);
        }

        done.store(true, Ordering::Release);
        arming.join().unwrap();
        judging.join().unwrap();
    }

    #[test]
    fn test_expect_n() {
        let monitor = ErrorMonitor::default();
        monitor.expect_n(Severity::Error, "X-001", 3);
        assert_eq!(monitor.outstanding(), 3);
        monitor.report(Severity::Error, "X-001");
        monitor.report(Severity::Error, "X-001");
        assert_eq!(monitor.outstanding(), 1);
        assert!(monitor.verify_found().is_err());
    }

    #[test]
    fn test_success_window_can_judge_warnings() {
        let monitor = ErrorMonitor::default();

        monitor.expect_success();
        monitor.report(Severity::Warning, "slow path");
        let verdict = monitor.verify_not_found().unwrap();
        assert_eq!(verdict.notes.len(), 1);

        monitor.expect_success_for(SeverityMask::ERROR | SeverityMask::WARNING);
        monitor.report(Severity::Warning, "slow path");
        assert!(monitor.verify_not_found().is_err());
    }

    #[test]
    fn test_reset_and_stats() {
        let monitor = ErrorMonitor::default();
        monitor.ignore(Severity::Error, "noise");
        monitor.expect(Severity::Error, "X-001");
        monitor.allow(Severity::Error, "Y-002");
        monitor.report(Severity::Error, "noise");
        monitor.report(Severity::Error, "Y-002");
        monitor.report(Severity::Info, "hello");
        monitor.report(Severity::Error, "boom");
        assert_eq!(monitor.unexpected_transcript().len(), 1);
        assert_eq!(monitor.notes().len(), 1);

        monitor.reset();
        assert_eq!(monitor.phase(), MonitorPhase::Idle);
        assert_eq!(monitor.outstanding(), 0);
        assert!(monitor.unexpected_transcript().is_empty());
        assert!(monitor.verify_not_found().is_ok());

        let stats = monitor.stats();
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.allowed, 1);
        assert_eq!(stats.notes, 1);
        assert_eq!(stats.unexpected, 1);
        assert_eq!(stats.satisfied, 0);

        // The ignore list survives reset, until it is cleared.
        monitor.report(Severity::Error, "noise");
        assert!(monitor.verify_not_found().is_ok());
        monitor.clear_ignored();
        monitor.report(Severity::Error, "noise");
        assert!(monitor.verify_not_found().is_err());
    }

    #[test]
    #[should_panic(expected = "X-001")]
    fn test_assert_found_panics_with_pattern() {
        let monitor = ErrorMonitor::default();
        monitor.expect(Severity::Error, "X-001");
        let _ = monitor.assert_found();
    }

    #[test]
    #[should_panic(expected = "2. [error] VUID-BBB-2 second")]
    fn test_assert_not_found_lists_every_unexpected_record() {
        let monitor = ErrorMonitor::default();
        monitor.expect_success();
        monitor.report(Severity::Error, "VUID-AAA-1 first");
        monitor.report(Severity::Error, "VUID-BBB-2 second");
        let _ = monitor.assert_not_found();
    }

    #[test]
    #[should_panic(expected = "VUID-ZZZ-9 unrelated")]
    fn test_assert_found_lists_unexpected_records_next_to_the_missing_one() {
        let monitor = ErrorMonitor::default();
        monitor.expect(Severity::Error, "X-001");
        monitor.report(Severity::Error, "VUID-ZZZ-9 unrelated");
        let _ = monitor.assert_found();
    }

    #[test]
    fn test_first_record_survives_a_full_transcript() {
        let monitor = ErrorMonitor::new(MonitorConfig::default().with_transcript_capacity(2));
        monitor.expect_success();
        for it in ["FIRST-A", "SECOND-B", "THIRD-C"] {
            monitor.report(Severity::Error, it);
        }

        match monitor.verify_not_found() {
            Err(MonitorError::UnexpectedErrors { count, first, .. }) => {
                assert_eq!(count, 3);
                assert_eq!(first.text, "FIRST-A");
            }
            other => panic!("expected UnexpectedErrors, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_expectation_carries_the_unexpected_count() {
        let monitor = ErrorMonitor::default();
        monitor.expect(Severity::Error, "X-001");
        monitor.report(Severity::Error, "VUID-ZZZ-9 unrelated");

        match monitor.verify_found() {
            Err(MonitorError::MissingExpectation {
                unexpected_count,
                transcript,
                ..
            }) => {
                assert_eq!(unexpected_count, 1);
                assert_eq!(transcript[0].text, "VUID-ZZZ-9 unrelated");
            }
            other => panic!("expected MissingExpectation, got {other:?}"),
        }
    }

    #[test]
    fn test_clones_share_state() {
        let monitor = ErrorMonitor::default();
        let source_side = monitor.clone();
        monitor.expect(Severity::Error, "X-001");
        source_side.report(Severity::Error, "X-001");
        assert!(monitor.verify_found().is_ok());
    }
}
