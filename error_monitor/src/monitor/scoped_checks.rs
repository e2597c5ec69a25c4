// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Run one operation inside one check. These read the same way as the `fail(|| ..)` /
//! `valid(|| ..)` helpers that GPU test suites use:
//!
//! ```
//! use conformance_error_monitor::{ErrorMonitor, Severity, expect_clean, expect_found};
//!
//! let monitor = ErrorMonitor::default();
//!
//! let (_, verdict) = expect_found(&monitor, Severity::Error, "VUID-Sampler-01234", || {
//!     monitor.report(Severity::Error, "[ VUID-Sampler-01234 ] anisotropy too high")
//! });
//! assert!(verdict.is_ok());
//!
//! let (value, verdict) = expect_clean(&monitor, || 42);
//! assert_eq!(value, 42);
//! assert!(verdict.is_ok());
//! ```

use super::{ErrorMonitor, MonitorError, Verdict};
use crate::{MessagePattern, Severity};

/// Arm one expectation, run `operation`, then [`ErrorMonitor::verify_found`].
pub fn expect_found<R>(
    monitor: &ErrorMonitor,
    severity: Severity,
    pattern: impl Into<MessagePattern>,
    operation: impl FnOnce() -> R,
) -> (R, Result<Verdict, MonitorError>) {
    monitor.expect(severity, pattern);
    let it = operation();
    (it, monitor.verify_found())
}

/// Open a success window, run `operation`, then [`ErrorMonitor::verify_not_found`].
/// Allowances registered before this call still apply.
pub fn expect_clean<R>(
    monitor: &ErrorMonitor,
    operation: impl FnOnce() -> R,
) -> (R, Result<Verdict, MonitorError>) {
    monitor.expect_success();
    let it = operation();
    (it, monitor.verify_not_found())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_found_fails_when_operation_is_silent() {
        let monitor = ErrorMonitor::default();
        let ((), verdict) = expect_found(&monitor, Severity::Error, "X-001", || ());
        assert!(matches!(verdict, Err(MonitorError::MissingExpectation { .. })));
    }

    #[test]
    fn test_expect_clean_with_prior_allowance() {
        let monitor = ErrorMonitor::default();
        monitor.allow(Severity::Error, "Y-002");
        let (_, verdict) = expect_clean(&monitor, || monitor.report(Severity::Error, "Y-002"));
        assert!(verdict.is_ok());
    }

    #[test]
    fn test_expect_clean_fails_on_error() {
        let monitor = ErrorMonitor::default();
        let (_, verdict) = expect_clean(&monitor, || monitor.report(Severity::Error, "boom"));
        assert!(matches!(verdict, Err(MonitorError::UnexpectedErrors { .. })));
    }
}
