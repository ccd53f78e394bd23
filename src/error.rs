use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum LineageError {
    #[error("File System error: {0}")]
    Io(String),
    #[error("Record Not Found: {0}")]
    NotFound(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Dangling reference: {referrer} {tag} points at missing record {missing}")]
    DanglingReference {
        missing: String,
        referrer: String,
        tag: String,
    },
    #[error("ERROR: ancestor walk from {start} exceeded {steps} steps (cyclic FAMC chain?)")]
    AncestorBound { start: String, steps: usize },
    #[error("Nothing to display: no anchor individual could be found")]
    EmptyGraph,
}

impl LineageError {
    pub fn not_found(kind: &str, id: &str) -> LineageError {
        LineageError::NotFound(format!("{kind} {id}"))
    }

    /// Whether the error points at bad input data rather than a bad request.
    pub fn is_data_fault(&self) -> bool {
        matches!(
            self,
            LineageError::DanglingReference { .. } | LineageError::AncestorBound { .. }
        )
    }
}

impl From<toml::de::Error> for LineageError {
    fn from(src: toml::de::Error) -> LineageError {
        LineageError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for LineageError {
    fn from(src: toml::ser::Error) -> LineageError {
        LineageError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for LineageError {
    fn from(src: JsonError) -> LineageError {
        LineageError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for LineageError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => LineageError::NotFound(format!("{x}")),
            _ => LineageError::Io(format!("IOError: {}", x.kind())),
        }
    }
}
