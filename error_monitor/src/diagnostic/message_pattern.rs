// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! What an expectation, allowance, or ignore entry matches against.
//!
//! Most tests only ever pass a string literal, which becomes a
//! [`MessagePattern::Substring`]. The other variants make intent explicit when a plain
//! substring would be ambiguous:
//!
//! | Variant                        | Matches when                                       |
//! |--------------------------------|----------------------------------------------------|
//! | [`MessagePattern::Substring`]  | `text` contains the pattern (case sensitive)       |
//! | [`MessagePattern::ExactId`]    | `message_id` equals it, or `text` has it as a token |
//! | [`MessagePattern::AnySeverity`]| always (the severity check alone decides)          |

use std::fmt::{Display, Formatter, Result};

use super::DiagnosticRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePattern {
    Substring(String),
    ExactId(String),
    AnySeverity,
}

impl MessagePattern {
    pub fn substring(it: impl Into<String>) -> Self { Self::Substring(it.into()) }

    pub fn exact_id(it: impl Into<String>) -> Self { Self::ExactId(it.into()) }

    /// Severity is checked by the caller (the entry owns the severity), so this only
    /// looks at the text and the message id.
    #[must_use]
    pub fn matches(&self, record: &DiagnosticRecord) -> bool {
        match self {
            MessagePattern::Substring(needle) => record.text.contains(needle.as_str()),
            MessagePattern::ExactId(id) => match record.message_id() {
                Some(record_id) => record_id == id,
                None => contains_token(&record.text, id),
            },
            MessagePattern::AnySeverity => true,
        }
    }
}

impl From<&str> for MessagePattern {
    fn from(it: &str) -> Self { Self::Substring(it.to_string()) }
}

impl From<String> for MessagePattern {
    fn from(it: String) -> Self { Self::Substring(it) }
}

impl From<&String> for MessagePattern {
    fn from(it: &String) -> Self { Self::Substring(it.clone()) }
}

impl Display for MessagePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            MessagePattern::Substring(it) => write!(f, "{it}"),
            MessagePattern::ExactId(it) => write!(f, "id:{it}"),
            MessagePattern::AnySeverity => write!(f, "<any message>"),
        }
    }
}

fn is_id_char(ch: char) -> bool { ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' }

/// `true` if `id` occurs in `haystack` bounded on both sides by a non identifier char
/// (or the start / end of the string). An empty `id` never matches.
fn contains_token(haystack: &str, id: &str) -> bool {
    if id.is_empty() {
        return false;
    }
    haystack.match_indices(id).any(|(start, _)| {
        let end = start + id.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|ch| !is_id_char(ch));
        let after_ok = haystack[end..].chars().next().is_none_or(|ch| !is_id_char(ch));
        before_ok && after_ok
    })
}
