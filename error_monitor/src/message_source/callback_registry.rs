// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use crate::{CallbackAction, ErrorMonitor, Severity};

/// The shape of the one entry point a message source needs. It may be invoked from any
/// thread, and from inside the call stack of the operation under test.
pub type DiagnosticCallback = Arc<dyn Fn(Severity, &str) -> CallbackAction + Send + Sync>;

/// Anything that can deliver diagnostics (eg: a validation layer's debug messenger).
/// Registering a second callback replaces the first.
pub trait MessageSource {
    fn register_callback(&mut self, callback: DiagnosticCallback);
}

impl ErrorMonitor {
    /// A callback that captures a clone of this monitor. Install it once, at the start of
    /// the session, with whatever the system under test uses to report diagnostics.
    #[must_use]
    pub fn callback(&self) -> DiagnosticCallback {
        let monitor = self.clone();
        Arc::new(move |severity, text| monitor.report(severity, text))
    }

    pub fn attach_to(&self, source: &mut impl MessageSource) {
        tracing::debug!(message = "🔌 attach error monitor to message source");
        source.register_callback(self.callback());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct OneShotSource {
        callback: Option<DiagnosticCallback>,
    }

    impl MessageSource for OneShotSource {
        fn register_callback(&mut self, callback: DiagnosticCallback) {
            self.callback = Some(callback);
        }
    }

    #[test]
    fn test_callback_feeds_the_monitor() {
        let monitor = ErrorMonitor::default();
        let mut source = OneShotSource::default();
        monitor.attach_to(&mut source);

        monitor.expect(Severity::Error, "VUID-1");
        let callback = source.callback.clone().unwrap();
        assert_eq!(callback(Severity::Error, "VUID-1 fired"), CallbackAction::SkipCall);
        assert_eq!(callback(Severity::Info, "VUID-1 fired"), CallbackAction::Continue);

        let verdict = monitor.verify_found().unwrap();
        assert_eq!(verdict.satisfied, 1);
        assert_eq!(verdict.notes.len(), 1);
    }

    #[test]
    fn test_callback_outlives_the_handle_it_came_from() {
        let monitor = ErrorMonitor::default();
        let callback = monitor.callback();
        let judge = monitor.clone();
        drop(monitor);

        judge.expect_success();
        let _ = callback(Severity::Error, "late");
        assert!(judge.verify_not_found().is_err());
    }
}
