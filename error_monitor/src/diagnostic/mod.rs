// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod diagnostic_record;
pub mod message_pattern;
pub mod severity;

// Re-export.
pub use diagnostic_record::*;
pub use message_pattern::*;
pub use severity::*;
