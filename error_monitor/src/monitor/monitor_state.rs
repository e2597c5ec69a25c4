// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The state that is shared between the test driver's thread and the message source's
//! calling context. Everything in here is plain data and runs under the single lock held
//! by [`crate::ErrorMonitor`]. Nothing in this module logs or calls out to other code.

use std::collections::VecDeque;

use strum_macros::Display;

use super::MonitorConfig;
use crate::{DiagnosticRecord, InlineVec, MessagePattern, Severity, SeverityMask};

/// Where the monitor is in its per-check lifecycle.
///
/// ```text
/// Idle --expect()/allow()--> Armed --on_diagnostic()*--> Armed
/// Armed --verify_found()--> Idle
/// Idle/Armed --expect_success()--> Watching --on_diagnostic()*--> Watching
/// Watching --verify_not_found()--> Idle
/// ```
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorPhase {
    #[default]
    Idle,
    Armed,
    Watching,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationEntry {
    pub severity: Severity,
    pub pattern: MessagePattern,
    pub satisfied: bool,
}

/// Used both for allowances (cleared at every checkpoint) and for the session wide
/// ignore list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowanceEntry {
    pub severity: Severity,
    pub pattern: MessagePattern,
}

fn entry_matches(
    severity: Severity,
    pattern: &MessagePattern,
    record: &DiagnosticRecord,
) -> bool {
    severity == record.severity && pattern.matches(record)
}

impl ExpectationEntry {
    #[must_use]
    pub fn matches(&self, record: &DiagnosticRecord) -> bool {
        entry_matches(self.severity, &self.pattern, record)
    }
}

impl AllowanceEntry {
    #[must_use]
    pub fn matches(&self, record: &DiagnosticRecord) -> bool {
        entry_matches(self.severity, &self.pattern, record)
    }
}

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Dropped by the session wide ignore list.
    Ignored,
    /// Consumed the unsatisfied expectation at this index.
    Satisfied { index: usize },
    Allowed,
    /// Error-like and unmatched. Poisons the next checkpoint.
    Unexpected,
    /// Not judged and unmatched.
    Note,
}

/// Lifetime counters, never reset by checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorStats {
    pub satisfied: usize,
    pub allowed: usize,
    pub ignored: usize,
    pub unexpected: usize,
    pub notes: usize,
    /// Records that were pushed out of a full transcript.
    pub dropped: usize,
}

/// Everything a checkpoint takes out of the state in one go.
#[derive(Debug, Default)]
pub struct DrainedCheck {
    pub phase: MonitorPhase,
    pub expectations: InlineVec<ExpectationEntry>,
    pub unexpected: Vec<DiagnosticRecord>,
    pub unexpected_count: usize,
    pub notes: Vec<DiagnosticRecord>,
}

#[derive(Debug)]
pub struct MonitorState {
    pub config: MonitorConfig,
    pub phase: MonitorPhase,
    /// Severities judged in the current window. Reset to `config.judged` at every
    /// checkpoint.
    pub judged: SeverityMask,
    pub expectations: InlineVec<ExpectationEntry>,
    pub allowances: InlineVec<AllowanceEntry>,
    pub ignored: InlineVec<AllowanceEntry>,
    pub unexpected: VecDeque<DiagnosticRecord>,
    /// Can be larger than `unexpected.len()` when the transcript overflowed.
    pub unexpected_count: usize,
    pub notes: VecDeque<DiagnosticRecord>,
    pub stats: MonitorStats,
}

impl MonitorState {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            phase: MonitorPhase::Idle,
            judged: config.judged,
            expectations: InlineVec::new(),
            allowances: InlineVec::new(),
            ignored: InlineVec::new(),
            unexpected: VecDeque::new(),
            unexpected_count: 0,
            notes: VecDeque::new(),
            stats: MonitorStats::default(),
        }
    }

    pub fn push_expectation(&mut self, severity: Severity, pattern: MessagePattern) {
        self.expectations.push(ExpectationEntry {
            severity,
            pattern,
            satisfied: false,
        });
        self.phase = MonitorPhase::Armed;
    }

    pub fn push_allowance(&mut self, severity: Severity, pattern: MessagePattern) {
        self.allowances.push(AllowanceEntry { severity, pattern });
        if self.phase == MonitorPhase::Idle {
            self.phase = MonitorPhase::Armed;
        }
    }

    pub fn push_ignored(&mut self, severity: Severity, pattern: MessagePattern) {
        self.ignored.push(AllowanceEntry { severity, pattern });
    }

    /// Start a success window. Stale unexpected records are thrown away so that the
    /// matching checkpoint only judges what happens after this call.
    pub fn begin_watching(&mut self, judged: SeverityMask) {
        self.unexpected.clear();
        self.unexpected_count = 0;
        self.judged = judged;
        self.phase = MonitorPhase::Watching;
    }

    /// The classification rules, in order:
    /// 1. Session wide ignore list.
    /// 2. First unsatisfied expectation that matches (consumed exactly once).
    /// 3. Any allowance that matches.
    /// 4. Judged severity -> unexpected, otherwise -> note.
    pub fn classify(&mut self, record: &DiagnosticRecord) -> Classification {
        if self.ignored.iter().any(|it| it.matches(record)) {
            self.stats.ignored += 1;
            return Classification::Ignored;
        }

        if let Some(index) = self
            .expectations
            .iter()
            .position(|it| !it.satisfied && it.matches(record))
        {
            self.expectations[index].satisfied = true;
            self.stats.satisfied += 1;
            return Classification::Satisfied { index };
        }

        if self.allowances.iter().any(|it| it.matches(record)) {
            self.stats.allowed += 1;
            return Classification::Allowed;
        }

        if self.judged.contains_severity(record.severity) {
            self.unexpected_count += 1;
            self.stats.unexpected += 1;
            let capacity = self.config.transcript_capacity;
            push_bounded(&mut self.unexpected, record, capacity, &mut self.stats.dropped);
            return Classification::Unexpected;
        }

        self.stats.notes += 1;
        if self.config.keep_notes {
            let capacity = self.config.transcript_capacity;
            push_bounded(&mut self.notes, record, capacity, &mut self.stats.dropped);
        }
        Classification::Note
    }

    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.expectations.iter().filter(|it| !it.satisfied).count()
    }

    /// Take everything that belongs to the current check and go back to
    /// [`MonitorPhase::Idle`]. The ignore list and the stats survive.
    pub fn drain_check(&mut self) -> DrainedCheck {
        let drained = DrainedCheck {
            phase: self.phase,
            expectations: std::mem::take(&mut self.expectations),
            unexpected: self.unexpected.drain(..).collect(),
            unexpected_count: self.unexpected_count,
            notes: self.notes.drain(..).collect(),
        };
        self.allowances.clear();
        self.unexpected_count = 0;
        self.judged = self.config.judged;
        self.phase = MonitorPhase::Idle;
        drained
    }
}

/// Keeps the head of the transcript: once full, later records are only counted. The
/// first offending record is what a failure report names, so it is never evicted. A
/// capacity of zero (eg: a struct literal config) is treated as one.
fn push_bounded(
    queue: &mut VecDeque<DiagnosticRecord>,
    record: &DiagnosticRecord,
    capacity: usize,
    dropped: &mut usize,
) {
    if queue.len() >= capacity.max(1) {
        *dropped += 1;
        return;
    }
    queue.push_back(record.clone());
}
