// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod error_monitor;
pub mod monitor_config;
pub mod monitor_error;
pub mod monitor_state;
pub mod scoped_checks;
pub mod verdict;

// Re-export.
pub use error_monitor::*;
pub use monitor_config::*;
pub use monitor_error::*;
pub use monitor_state::*;
pub use scoped_checks::*;
pub use verdict::*;
