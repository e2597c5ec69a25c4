// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A [`tracing_subscriber::Layer`] that lets a system under test report diagnostics
//! through plain `tracing` macros instead of a bespoke callback:
//!
//! ```
//! use conformance_error_monitor::{ErrorMonitor, MessagePattern, MonitorLayer, Severity};
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let monitor = ErrorMonitor::default();
//! let subscriber =
//!     tracing_subscriber::registry().with(MonitorLayer::new(monitor.clone()));
//!
//! monitor.expect(Severity::Error, MessagePattern::exact_id("VUID-Image-00123"));
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::error!(target: "validation", vuid = "VUID-Image-00123", "extent is zero");
//! });
//! assert!(monitor.verify_found().is_ok());
//! ```
//!
//! Only events whose target starts with the configured prefix are forwarded. The fields
//! that are understood are:
//! - `message` -> [`DiagnosticRecord::text`].
//! - `vuid` -> [`DiagnosticRecord::message_id`].
//! - `severity` -> overrides the level derived severity (eg: `severity = "perf"`).

use std::{fmt, str::FromStr};

use tracing::{Event, Subscriber,
              field::{Field, Visit}};
use tracing_subscriber::{Layer, layer::Context};

use crate::{DiagnosticRecord, ErrorMonitor, Severity};

pub const DEFAULT_TARGET_PREFIX: &str = "validation";

#[derive(Debug, Clone)]
pub struct MonitorLayer {
    monitor: ErrorMonitor,
    target_prefix: String,
}

impl MonitorLayer {
    #[must_use]
    pub fn new(monitor: ErrorMonitor) -> Self {
        Self {
            monitor,
            target_prefix: DEFAULT_TARGET_PREFIX.to_string(),
        }
    }

    #[must_use]
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = prefix.into();
        self
    }
}

impl<S: Subscriber> Layer<S> for MonitorLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(self.target_prefix.as_str()) {
            return;
        }

        let mut fields = DiagnosticFields::default();
        event.record(&mut fields);

        let severity = fields
            .severity
            .unwrap_or_else(|| Severity::from_level(*metadata.level()));
        let mut record =
            DiagnosticRecord::new(severity, fields.message.unwrap_or_default());
        if let Some(vuid) = fields.vuid {
            record = record.with_message_id(&vuid);
        }

        let _ = self.monitor.on_diagnostic(&record);
    }
}

#[derive(Debug, Default)]
struct DiagnosticFields {
    message: Option<String>,
    vuid: Option<String>,
    severity: Option<Severity>,
}

impl DiagnosticFields {
    fn set(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "vuid" => self.vuid = Some(value),
            "severity" => self.severity = Severity::from_str(&value).ok(),
            _ => {}
        }
    }
}

impl Visit for DiagnosticFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.set(field, format!("{value:?}"));
    }
}
