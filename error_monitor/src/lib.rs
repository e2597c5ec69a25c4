// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

//! # Conformance error monitor
//!
//! A diagnostic expectation oracle for conformance tests of a graphics validation layer.
//! A test case drives an API, and the validation layer reports rule violations through
//! a callback. Every test case needs the same thing: "I expect *this* violation to be
//! reported, and *nothing else* that looks like an error". This crate is that thing.
//!
//! # Table of contents
//!
//! - [Usage](#usage)
//! - [Classification](#classification)
//! - [Logging](#logging)
//!
//! # Usage
//!
//! 1. Create one [`ErrorMonitor`] per test session, and install its callback with the
//!    message source once ([`ErrorMonitor::attach_to`] or [`MonitorLayer`]).
//! 2. For each test step, arm it with [`ErrorMonitor::expect`] (the operation must
//!    trigger a violation) or [`ErrorMonitor::expect_success`] (it must not).
//!    Tolerate flaky or driver specific messages with [`ErrorMonitor::allow`].
//! 3. Perform exactly one operation.
//! 4. Judge it with [`ErrorMonitor::verify_found`] or [`ErrorMonitor::verify_not_found`].
//!    Both clear the per-check state whatever the outcome.
//!
//! ```
//! use conformance_error_monitor::{ErrorMonitor, Severity};
//! use conformance_test_fixtures::MockValidationLayer;
//!
//! let monitor = ErrorMonitor::default();
//! let mut layer = MockValidationLayer::default()
//!     .with_rule("draw_unbound", Severity::Error, "VUID-vkCmdDraw-None-02697: no pipeline")
//!     .with_rule("draw_bound", Severity::Info, "draw recorded");
//! monitor.attach_to(&mut layer);
//!
//! monitor.expect(Severity::Error, "VUID-vkCmdDraw-None-02697");
//! layer.perform("draw_unbound");
//! monitor.assert_found();
//!
//! monitor.expect_success();
//! layer.perform("draw_bound");
//! monitor.assert_not_found();
//! ```
//!
//! # Classification
//!
//! Each record is classified once, on delivery, in this order:
//! 1. The session wide ignore list ([`ErrorMonitor::ignore`]) drops it.
//! 2. The first unsatisfied expectation that matches consumes it.
//! 3. Any allowance that matches absorbs it.
//! 4. A judged severity (see [`MonitorConfig::judged`]) makes it unexpected. Anything else
//!    is kept as a note.
//!
//! # Logging
//!
//! The monitor logs every classification with [`tracing`]. Use
//! [`try_initialize_logging_thread_local`] with a [`TracingConfig`] to see it, and
//! [`TracingConfig::with_monitor_bridge`] to route `tracing` events from the system under
//! test into the monitor.

// Enforce strict error handling in production library code only. Tests are allowed to
// use .unwrap() (workspace `Cargo.toml` config allows it).
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod diagnostic;
pub mod log;
pub mod message_source;
pub mod monitor;
pub mod stack_alloc_types;

// Re-export.
pub use diagnostic::*;
pub use log::*;
pub use message_source::*;
pub use monitor::*;
pub use stack_alloc_types::*;

/// Avoid confusion with `tokio::sync::Mutex` in code that uses both.
pub type StdMutex<T> = std::sync::Mutex<T>;
