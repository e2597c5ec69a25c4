// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{ops::Add, str::FromStr};

use miette::{Context, IntoDiagnostic};
use tracing_core::LevelFilter;

use crate::{ErrorMonitor, MonitorLayer};

pub const DEFAULT_LOG_FILE_NAME: &str = "error_monitor_log.txt";

/// Env var that overrides the log level, eg: `ERROR_MONITOR_LOG=debug`.
pub const LOG_LEVEL_ENV_VAR: &str = "ERROR_MONITOR_LOG";

/// Configure the tracing logging for a test run. You can display the logs to a:
/// 1. file,
/// 2. stdout or stderr,
/// 3. both.
///
/// This configuration also allows you to set the log level, and to bridge `tracing`
/// events from the system under test into an [`ErrorMonitor`].
///
/// Any of the parts can be converted into a whole config, and configs can be merged with
/// `+` (the `rhs` has higher specificity):
///
/// ```
/// use conformance_error_monitor::{DisplayPreference, TracingConfig, WriterConfig};
///
/// let config_1: TracingConfig = tracing::Level::DEBUG.into();
/// let config_2: TracingConfig = DisplayPreference::Stderr.into();
/// let merged = config_1 + config_2;
/// assert_eq!(
///     merged.get_writer_config(),
///     WriterConfig::DisplayAndFile(
///         DisplayPreference::Stderr,
///         conformance_error_monitor::DEFAULT_LOG_FILE_NAME.to_string()
///     )
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub writer_config: WriterConfig,
    pub level_filter: LevelFilter,
    pub monitor_bridge: Option<MonitorLayer>,
}

/// - `File(String)` is the file path to use for the log file, eg: `/tmp/conformance.log`.
/// - `Display(DisplayPreference)` is the preferred display to use for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterConfig {
    None,
    Display(DisplayPreference),
    File(String),
    DisplayAndFile(DisplayPreference, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPreference {
    Stdout,
    Stderr,
}

impl TracingConfig {
    pub fn get_writer_config(&self) -> WriterConfig { self.writer_config.clone() }

    pub fn get_level_filter(&self) -> LevelFilter { self.level_filter }

    /// Add a [`MonitorLayer`] to the layers created from this config.
    #[must_use]
    pub fn with_monitor_bridge(mut self, monitor: &ErrorMonitor) -> Self {
        self.monitor_bridge = Some(MonitorLayer::new(monitor.clone()));
        self
    }

    /// Display to stderr at the level given by [`LOG_LEVEL_ENV_VAR`]. Logging is off when
    /// the variable is not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is set but is not a valid level filter.
    pub fn from_env() -> miette::Result<Self> {
        let level_filter = match std::env::var(LOG_LEVEL_ENV_VAR) {
            Ok(value) => LevelFilter::from_str(value.trim())
                .into_diagnostic()
                .wrap_err(format!("Invalid {LOG_LEVEL_ENV_VAR} value: '{value}'"))?,
            Err(_) => LevelFilter::OFF,
        };
        Ok(Self {
            writer_config: WriterConfig::Display(DisplayPreference::Stderr),
            level_filter,
            monitor_bridge: None,
        })
    }
}

impl From<tracing::Level> for TracingConfig {
    fn from(level: tracing::Level) -> Self { LevelFilter::from_level(level).into() }
}

impl From<LevelFilter> for TracingConfig {
    fn from(level_filter: LevelFilter) -> Self {
        Self {
            level_filter,
            writer_config: WriterConfig::File(DEFAULT_LOG_FILE_NAME.to_string()),
            monitor_bridge: None,
        }
    }
}

impl From<DisplayPreference> for TracingConfig {
    fn from(preferred_display: DisplayPreference) -> Self {
        WriterConfig::Display(preferred_display).into()
    }
}

impl From<WriterConfig> for TracingConfig {
    fn from(writer_config: WriterConfig) -> Self {
        Self {
            level_filter: LevelFilter::DEBUG,
            writer_config,
            monitor_bridge: None,
        }
    }
}

/// Merge two [`TracingConfig`] instances together. The more verbose level wins, and a
/// bridge on either side is kept (`rhs` first).
impl Add<TracingConfig> for TracingConfig {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            level_filter: self.level_filter.max(rhs.level_filter),
            writer_config: self.writer_config + rhs.writer_config,
            monitor_bridge: rhs.monitor_bridge.or(self.monitor_bridge),
        }
    }
}

/// Merge two [`WriterConfig`] instances together. The `rhs` clobbers `self` where both
/// have a value, and [`WriterConfig::None`] never clobbers anything:
/// - `{display: stdout} + {file: "a"} = {display: stdout, file: "a"}`.
/// - `{display: stdout} + {display: stderr} = {display: stderr}`.
/// - `{file: "a"} + None = {file: "a"}`.
impl Add<WriterConfig> for WriterConfig {
    type Output = Self;

    fn add(self, rhs: WriterConfig) -> Self::Output {
        match (self, rhs) {
            (WriterConfig::None, it) | (it, WriterConfig::None) => it,
            (
                WriterConfig::Display(display) | WriterConfig::DisplayAndFile(display, _),
                WriterConfig::File(file),
            )
            | (
                WriterConfig::File(file) | WriterConfig::DisplayAndFile(_, file),
                WriterConfig::Display(display),
            ) => WriterConfig::DisplayAndFile(display, file),
            (_, rhs) => rhs,
        }
    }
}
