// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Fixtures for testing code that uses `conformance_error_monitor`: a fake validation
//! layer to drive the monitor, and a temp dir for file logging tests. This crate is
//! only meant to be used as a dev dependency.

// Enforce strict error handling in production library code only.
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod mock_validation_layer;
pub mod temp_dir;

// Re-export.
pub use mock_validation_layer::*;
pub use temp_dir::*;
