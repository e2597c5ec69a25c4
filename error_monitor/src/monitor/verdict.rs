// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use strum_macros::Display;

use crate::DiagnosticRecord;

/// The two ways a test driver can close a check.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    #[strum(to_string = "verify_found")]
    VerifyFound,
    #[strum(to_string = "verify_not_found")]
    VerifyNotFound,
}

/// Report for a checkpoint that passed. A failed checkpoint returns a
/// [`crate::MonitorError`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub checkpoint: Checkpoint,
    /// Number of expectations that were satisfied in this check.
    pub satisfied: usize,
    /// Unexpected records that were tolerated. Only ever non empty when the monitor is
    /// configured with [`crate::UnexpectedErrorPolicy::ReportOnly`].
    pub unexpected: Vec<DiagnosticRecord>,
    /// Records that were not judged (eg: info messages), kept for test output.
    pub notes: Vec<DiagnosticRecord>,
}

impl Verdict {
    /// `true` when nothing was tolerated, ie the check was clean.
    #[must_use]
    pub fn is_clean(&self) -> bool { self.unexpected.is_empty() }
}
