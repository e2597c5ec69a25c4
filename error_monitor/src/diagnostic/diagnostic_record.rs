// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::fmt::{Display, Formatter, Result};

use super::Severity;
use crate::InlineString;

/// A single diagnostic produced by the message source. The monitor only inspects it
/// during the call that delivers it, and clones it into a transcript when it needs to be
/// reported later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    pub text: String,
    /// The rule-violation identifier, when the source reports it separately from the
    /// free text (eg: a `VUID-...` string). When absent the identifier is assumed to be
    /// embedded somewhere in [`DiagnosticRecord::text`].
    pub message_id: Option<InlineString>,
}

impl DiagnosticRecord {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            message_id: None,
        }
    }

    #[must_use]
    pub fn with_message_id(mut self, message_id: &str) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    #[must_use]
    pub fn message_id(&self) -> Option<&str> { self.message_id.as_deref() }
}

impl Display for DiagnosticRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.message_id {
            Some(id) => write!(f, "[{}] {}: {}", self.severity, id, self.text),
            None => write!(f, "[{}] {}", self.severity, self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_display_with_and_without_id() {
        let plain = DiagnosticRecord::new(Severity::Error, "buffer size is zero");
        assert_eq!(plain.to_string(), "[error] buffer size is zero");

        let tagged = plain.clone().with_message_id("VUID-Buffer-size-00912");
        assert_eq!(tagged.message_id(), Some("VUID-Buffer-size-00912"));
        assert_eq!(
            tagged.to_string(),
            "[error] VUID-Buffer-size-00912: buffer size is zero"
        );
    }
}
