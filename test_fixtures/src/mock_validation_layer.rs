// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A fake validation layer, so tests read as "arm, perform operation, verify":
//!
//! ```
//! use conformance_error_monitor::{ErrorMonitor, Severity};
//! use conformance_test_fixtures::MockValidationLayer;
//!
//! let monitor = ErrorMonitor::default();
//! let mut layer = MockValidationLayer::default().with_rule(
//!     "create_buffer_size_zero",
//!     Severity::Error,
//!     "Validation Error: [ VUID-VkBufferCreateInfo-size-00912 ] size is 0",
//! );
//! monitor.attach_to(&mut layer);
//!
//! monitor.expect(Severity::Error, "VUID-VkBufferCreateInfo-size-00912");
//! layer.perform("create_buffer_size_zero");
//! assert!(monitor.verify_found().is_ok());
//! ```

use std::{collections::HashMap,
          sync::{Arc, PoisonError}};

use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::{Context, SubscriberExt}};

use conformance_error_monitor::{CallbackAction, DiagnosticCallback, InlineVec,
                                MessageSource, Severity, StdMutex};

/// Diagnostics that one named operation emits, in order.
pub type RuleTable = HashMap<String, InlineVec<(Severity, String)>>;

#[derive(Default)]
pub struct MockValidationLayer {
    callback: Option<DiagnosticCallback>,
    rules: RuleTable,
}

impl std::fmt::Debug for MockValidationLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockValidationLayer")
            .field("has_callback", &self.callback.is_some())
            .field("rules", &self.rules)
            .finish()
    }
}

impl MessageSource for MockValidationLayer {
    fn register_callback(&mut self, callback: DiagnosticCallback) {
        self.callback = Some(callback);
    }
}

impl MockValidationLayer {
    /// Register a diagnostic that [`MockValidationLayer::perform`] emits for `op`. Call
    /// it more than once for an operation that breaks several rules.
    #[must_use]
    pub fn with_rule(
        mut self,
        op: &str,
        severity: Severity,
        text: impl Into<String>,
    ) -> Self {
        self.rules
            .entry(op.to_string())
            .or_default()
            .push((severity, text.into()));
        self
    }

    /// Deliver on the caller's thread. Without a registered callback the message is
    /// dropped, like a real layer with no debug messenger.
    pub fn emit(&self, severity: Severity, text: &str) -> CallbackAction {
        match &self.callback {
            Some(callback) => callback(severity, text),
            None => CallbackAction::Continue,
        }
    }

    /// Deliver from a freshly spawned OS thread, like a driver worker thread. The thread
    /// is joined before returning, and a panic inside it is resumed on the caller.
    pub fn emit_from_thread(&self, severity: Severity, text: &str) -> CallbackAction {
        let Some(callback) = self.callback.clone() else {
            return CallbackAction::Continue;
        };
        let text = text.to_string();
        std::thread::spawn(move || callback(severity, &text))
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
    }

    /// Deliver `outer`, and deliver `nested` from inside the processing of `outer`. The
    /// nested delivery is triggered by the first `tracing` event the callback emits
    /// while handling `outer` (the monitor logs every classification), so it re-enters
    /// the callback on the same thread. If the callback never logs, `nested` is
    /// delivered after `outer` returns.
    ///
    /// Returns the action for `outer`.
    pub fn emit_reentrant(
        &self,
        outer: (Severity, &str),
        nested: (Severity, &str),
    ) -> CallbackAction {
        let Some(callback) = self.callback.clone() else {
            return CallbackAction::Continue;
        };

        let pending: PendingDiagnostic =
            Arc::new(StdMutex::new(Some((nested.0, nested.1.to_string()))));
        let trigger = ReentrantTrigger {
            callback: callback.clone(),
            pending: pending.clone(),
        };

        let subscriber = tracing_subscriber::registry().with(trigger);
        let action = tracing::subscriber::with_default(subscriber, || {
            callback(outer.0, outer.1)
        });

        if let Some((severity, text)) = take_pending(&pending) {
            let _ = callback(severity, &text);
        }

        action
    }

    /// Run every diagnostic registered for `op`, in order. Returns
    /// [`CallbackAction::SkipCall`] if any delivery asked to skip the call. An unknown
    /// operation is valid and emits nothing.
    pub fn perform(&self, op: &str) -> CallbackAction {
        tracing::debug!(message = "🧪 perform", op = op);
        let Some(diagnostics) = self.rules.get(op) else {
            return CallbackAction::Continue;
        };

        diagnostics
            .iter()
            .map(|(severity, text)| self.emit(*severity, text))
            .fold(CallbackAction::Continue, |acc, it| match it {
                CallbackAction::SkipCall => CallbackAction::SkipCall,
                CallbackAction::Continue => acc,
            })
    }
}

type PendingDiagnostic = Arc<StdMutex<Option<(Severity, String)>>>;

fn take_pending(pending: &PendingDiagnostic) -> Option<(Severity, String)> {
    pending.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Fires the pending diagnostic from inside the first event it sees.
struct ReentrantTrigger {
    callback: DiagnosticCallback,
    pending: PendingDiagnostic,
}

impl<S: Subscriber> Layer<S> for ReentrantTrigger {
    fn on_event(&self, _event: &Event<'_>, _ctx: Context<'_, S>) {
        // The slot's guard is dropped before the callback runs.
        if let Some((severity, text)) = take_pending(&self.pending) {
            let _ = (self.callback)(severity, &text);
        }
    }
}
