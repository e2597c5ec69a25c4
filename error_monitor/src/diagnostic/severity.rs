// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use bitflags::bitflags;
use strum_macros::{Display, EnumIter, EnumString};

/// The class tag that the system under test attaches to every diagnostic it reports.
///
/// Only the severities that are contained in the monitor's judged [`SeverityMask`] can
/// ever fail a checkpoint. Everything else is kept as a note for test output.
#[derive(
    Debug, Display, EnumString, EnumIter, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum Severity {
    #[strum(to_string = "error", serialize = "ERROR")]
    Error,
    #[strum(to_string = "warning", serialize = "WARN")]
    Warning,
    #[strum(to_string = "perf", serialize = "PERF")]
    PerformanceWarning,
    #[strum(to_string = "info", serialize = "INFO")]
    Info,
    #[strum(to_string = "verbose", serialize = "VERBOSE")]
    Verbose,
}

impl Severity {
    /// Map a [`tracing::Level`] onto a severity. Used by the tracing bridge, where there
    /// is no separate performance warning level.
    #[must_use]
    pub fn from_level(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::INFO => Severity::Info,
            // DEBUG and TRACE.
            _ => Severity::Verbose,
        }
    }

    #[must_use]
    pub fn as_mask(self) -> SeverityMask {
        match self {
            Severity::Error => SeverityMask::ERROR,
            Severity::Warning => SeverityMask::WARNING,
            Severity::PerformanceWarning => SeverityMask::PERFORMANCE_WARNING,
            Severity::Info => SeverityMask::INFO,
            Severity::Verbose => SeverityMask::VERBOSE,
        }
    }
}

bitflags! {
    /// Set of severities. The monitor uses this to decide which records are "error
    /// like", i.e. which unmatched records poison the next checkpoint.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SeverityMask: u8 {
        const ERROR = 1 << 0;
        const WARNING = 1 << 1;
        const PERFORMANCE_WARNING = 1 << 2;
        const INFO = 1 << 3;
        const VERBOSE = 1 << 4;
        const ALL = Self::ERROR.bits()
            | Self::WARNING.bits()
            | Self::PERFORMANCE_WARNING.bits()
            | Self::INFO.bits()
            | Self::VERBOSE.bits();
    }
}

impl Default for SeverityMask {
    fn default() -> Self { SeverityMask::ERROR }
}

impl SeverityMask {
    #[must_use]
    pub fn contains_severity(&self, severity: Severity) -> bool {
        self.contains(severity.as_mask())
    }
}

impl From<Severity> for SeverityMask {
    fn from(severity: Severity) -> Self { severity.as_mask() }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;
    use test_case::test_case;

    use super::*;

    #[test_case(tracing::Level::ERROR, Severity::Error)]
    #[test_case(tracing::Level::WARN, Severity::Warning)]
    #[test_case(tracing::Level::INFO, Severity::Info)]
    #[test_case(tracing::Level::DEBUG, Severity::Verbose)]
    #[test_case(tracing::Level::TRACE, Severity::Verbose)]
    fn test_from_level(level: tracing::Level, expected: Severity) {
        assert_eq!(Severity::from_level(level), expected);
    }

    #[test]
    fn test_default_mask_judges_errors_only() {
        let mask = SeverityMask::default();
        assert!(mask.contains_severity(Severity::Error));
        for it in Severity::iter().filter(|it| *it != Severity::Error) {
            assert!(!mask.contains_severity(it), "{it} should not be judged");
        }
    }

    #[test]
    fn test_all_mask_contains_every_severity() {
        for it in Severity::iter() {
            assert!(SeverityMask::ALL.contains_severity(it));
        }
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(Severity::from_str("WARN").unwrap(), Severity::Warning);
        assert_eq!(Severity::from_str("perf").unwrap(), Severity::PerformanceWarning);
        assert_eq!(Severity::Error.to_string(), "error");
        assert!(Severity::from_str("fatal").is_err());
    }
}
