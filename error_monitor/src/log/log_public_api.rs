// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tracing::dispatcher;
use tracing_core::LevelFilter;

use super::TracingConfig;

/// Both functions receive a type that implements [`Into<TracingConfig>`], so a test can
/// pass a level, a writer config, a display preference, or a merged config:
///
/// ```no_run
/// use conformance_error_monitor::{
///     DisplayPreference, ErrorMonitor, TracingConfig, WriterConfig,
///     try_initialize_logging_global, try_initialize_logging_thread_local,
/// };
///
/// let monitor = ErrorMonitor::default();
///
/// let config_1: TracingConfig = tracing::Level::DEBUG.into();
/// let config_2: TracingConfig = DisplayPreference::Stderr.into();
/// let config_3: TracingConfig = WriterConfig::File("conformance.log".to_string()).into();
///
/// let _guard = try_initialize_logging_thread_local(
///     (config_1 + config_2).with_monitor_bridge(&monitor),
/// );
/// let _ = try_initialize_logging_global(config_3);
/// ```
///
/// Logging is **DISABLED** by **default**. With a level filter of [`LevelFilter::OFF`]
/// and no monitor bridge, nothing is installed.
///
/// # Errors
///
/// Returns an error if the log file can't be created, or a global subscriber is already
/// set.
pub fn try_initialize_logging_global(
    options: impl Into<TracingConfig>,
) -> miette::Result<()> {
    let it: TracingConfig = options.into();

    if is_disabled(&it) {
        return Ok(());
    }

    it.install_global()
}

/// Thread local subscriber, which is great for tests, since each test thread can have
/// its own monitor bridge and level. The subscriber stays installed until the returned
/// guard is dropped. Returns `None` when logging is disabled, see
/// [`try_initialize_logging_global`].
///
/// # Errors
///
/// Returns an error if the log file can't be created.
pub fn try_initialize_logging_thread_local(
    options: impl Into<TracingConfig>,
) -> miette::Result<Option<dispatcher::DefaultGuard>> {
    let it: TracingConfig = options.into();

    if is_disabled(&it) {
        return Ok(None);
    }

    it.install_thread_local().map(Some)
}

fn is_disabled(config: &TracingConfig) -> bool {
    config.get_level_filter() == LevelFilter::OFF && config.monitor_bridge.is_none()
}
