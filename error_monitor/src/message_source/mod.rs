// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod callback_registry;
pub mod tracing_bridge;

// Re-export.
pub use callback_registry::*;
pub use tracing_bridge::*;
