// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::ops::Add;

use crate::SeverityMask;

pub const DEFAULT_TRANSCRIPT_CAPACITY: usize = 64;

/// What [`crate::ErrorMonitor::verify_found`] does with error-like records that matched
/// neither an expectation nor an allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnexpectedErrorPolicy {
    /// The checkpoint fails, even when every expectation was satisfied.
    #[default]
    FailCheckpoint,
    /// The checkpoint passes when every expectation was satisfied. The unexpected
    /// records are logged and handed back on the [`crate::Verdict`].
    ReportOnly,
}

/// Configure the [`crate::ErrorMonitor`]. Like the tracing config, any of the parts can
/// be converted into a whole config, and configs can be merged with `+`:
///
/// ```
/// use conformance_error_monitor::{MonitorConfig, SeverityMask, UnexpectedErrorPolicy};
///
/// let config: MonitorConfig = SeverityMask::ERROR.into();
/// let config = config + UnexpectedErrorPolicy::ReportOnly.into();
/// assert_eq!(config.unexpected_policy, UnexpectedErrorPolicy::ReportOnly);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Severities that are "error like". An unmatched record with one of these
    /// severities poisons the next checkpoint.
    pub judged: SeverityMask,
    pub unexpected_policy: UnexpectedErrorPolicy,
    /// Max number of unexpected records (and notes) retained between checkpoints. The
    /// earliest records are kept, later ones are only counted.
    pub transcript_capacity: usize,
    /// Retain records that are not judged, so they can be shown in test output.
    pub keep_notes: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            judged: SeverityMask::default(),
            unexpected_policy: UnexpectedErrorPolicy::default(),
            transcript_capacity: DEFAULT_TRANSCRIPT_CAPACITY,
            keep_notes: true,
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn with_judged(mut self, judged: SeverityMask) -> Self {
        self.judged = judged;
        self
    }

    #[must_use]
    pub fn with_unexpected_policy(mut self, policy: UnexpectedErrorPolicy) -> Self {
        self.unexpected_policy = policy;
        self
    }

    /// A capacity of zero is bumped to one, so the first offending record is always
    /// available for the failure report.
    #[must_use]
    pub fn with_transcript_capacity(mut self, capacity: usize) -> Self {
        self.transcript_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_keep_notes(mut self, keep_notes: bool) -> Self {
        self.keep_notes = keep_notes;
        self
    }
}

impl From<SeverityMask> for MonitorConfig {
    fn from(judged: SeverityMask) -> Self { Self::default().with_judged(judged) }
}

impl From<UnexpectedErrorPolicy> for MonitorConfig {
    fn from(policy: UnexpectedErrorPolicy) -> Self {
        Self::default().with_unexpected_policy(policy)
    }
}

/// Merge two configs. Masks are unioned, the larger capacity wins, notes are kept if
/// either side keeps them, and a non default policy on either side wins (`rhs` first).
impl Add<MonitorConfig> for MonitorConfig {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let unexpected_policy = match (self.unexpected_policy, rhs.unexpected_policy) {
            (lhs, UnexpectedErrorPolicy::FailCheckpoint) => lhs,
            (_, rhs) => rhs,
        };
        Self {
            judged: self.judged | rhs.judged,
            unexpected_policy,
            transcript_capacity: self.transcript_capacity.max(rhs.transcript_capacity),
            keep_notes: self.keep_notes || rhs.keep_notes,
        }
    }
}
