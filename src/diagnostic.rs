//! Diagnostic types for fail-soft parsing, layout and integrity checks.
//!
//! Diagnostics represent non-fatal issues. A malformed line or a pointer to a missing family must
//! not throw away an entire imported tree, so these are collected and handed back next to the
//! result instead of being raised as [`LineageError`](crate::LineageError)s.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A line that could not be tokenized. The line was skipped.
    MalformedLine {
        /// 1-based input line number
        line: usize,
        content: String,
        reason: String,
    },

    /// A value shaped like `@...@` was moved into the record's id slot on a tag that does not
    /// normally carry a pointer. Kept for compatibility with producers that misplace identifiers,
    /// but worth a human look.
    IdInValue {
        line: usize,
        tag: String,
        id: String,
    },

    /// A relationship pointer whose target is not in the graph index.
    DanglingReference {
        missing: String,
        referrer: String,
        tag: String,
    },

    /// A structural inconsistency between two records that both exist, e.g. a FAMC without the
    /// matching CHIL on the family.
    MissingBacklink {
        from: String,
        tag: String,
        to: String,
        expected: String,
    },

    /// Individuals present in the index but not reachable from the layout anchor.
    Unreachable(Vec<String>),
}

impl Diagnostic {
    pub fn malformed(line: usize, content: &str, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }

    pub fn dangling(missing: &str, referrer: &str, tag: &str) -> Self {
        Self::DanglingReference {
            missing: missing.to_string(),
            referrer: referrer.to_string(),
            tag: tag.to_string(),
        }
    }

    pub fn is_malformed_line(&self) -> bool {
        matches!(self, Self::MalformedLine { .. })
    }

    pub fn is_dangling_reference(&self) -> bool {
        matches!(self, Self::DanglingReference { .. })
    }

    /// Whether the diagnostic describes data the caller should fix, as opposed to information.
    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::Unreachable(_))
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedLine {
                line,
                content,
                reason,
            } => write!(f, "Line {line} skipped ({reason}): {content:?}"),
            Self::IdInValue { line, tag, id } => {
                write!(f, "Line {line}: value {id} of {tag} read as an id, please review")
            }
            Self::DanglingReference {
                missing,
                referrer,
                tag,
            } => write!(f, "{referrer} {tag} {missing}: no such record"),
            Self::MissingBacklink {
                from,
                tag,
                to,
                expected,
            } => write!(f, "{from} {tag} {to}, but {to} has no {expected} {from}"),
            Self::Unreachable(ids) => {
                write!(f, "{} individual(s) not connected to the anchor: {}", ids.len(), ids.join(", "))
            }
        }
    }
}
